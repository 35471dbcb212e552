// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Multi-Provider LLM Gateway
//!
//! Serves a unified REST contract over four LLM backends. The model
//! catalog is loaded once at startup and is immutable afterwards;
//! backend credentials are read from the environment on first use, so a
//! deployment only needs variables for the backends its catalog routes
//! to.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use llm_gateway::application::DispatchService;
use llm_gateway::domain::model::ModelCatalog;
use llm_gateway::infrastructure::llm::ProviderFactory;
use llm_gateway::presentation::api;

/// Multi-provider LLM gateway - one REST contract, four backends
#[derive(Parser)]
#[command(name = "aegis-llm-gateway")]
#[command(version, about, long_about = None)]
struct Cli {
    /// HTTP API host
    #[arg(long, env = "LLM_GATEWAY_HOST", default_value = "127.0.0.1")]
    host: String,

    /// HTTP API port
    #[arg(long, env = "LLM_GATEWAY_PORT", default_value = "8000")]
    port: u16,

    /// Path to the model catalog file
    #[arg(
        short,
        long,
        env = "LLM_GATEWAY_CONFIG",
        value_name = "FILE",
        default_value = "models.json"
    )]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LLM_GATEWAY_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    // Eager, fail-fast catalog load: a malformed catalog never reaches
    // request handling.
    let catalog = ModelCatalog::from_path(&cli.config)
        .with_context(|| format!("Failed to load model catalog from {}", cli.config.display()))?;
    info!(
        models = catalog.len(),
        config = %cli.config.display(),
        "Model catalog loaded"
    );

    let dispatch = Arc::new(DispatchService::new(
        Arc::new(catalog),
        Arc::new(ProviderFactory::new()),
    ));
    let app = api::app(dispatch);

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Multi-Provider LLM API listening");

    axum::serve(listener, app)
        .await
        .context("HTTP server terminated")?;

    Ok(())
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
