// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// LLM Provider Infrastructure - Anti-Corruption Layer Implementations
//
// One adapter per backend. Each adapter translates between the domain
// capability contract and one external wire protocol; backend-native
// failures are folded into GatewayError before they leave this layer.

pub mod anthropic;
pub mod azure_openai;
pub mod bedrock;
pub mod credentials;
pub mod factory;
pub mod openai;

pub use factory::{ProviderFactory, ProviderSource};

use crate::domain::error::GatewayError;
use crate::domain::model::ProviderKind;

/// Fold a non-success HTTP response into the uniform upstream error,
/// preserving the backend's own message for diagnostics.
pub(crate) async fn upstream_failure(
    backend: ProviderKind,
    response: reqwest::Response,
) -> GatewayError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    GatewayError::upstream(backend, format!("HTTP {status}: {body}"))
}
