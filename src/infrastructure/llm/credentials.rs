// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Per-backend connection parameters, sourced from the process
// environment at factory first-use. Absence of a backend's variables is
// only an error when a request actually targets that backend.
//
// Credentials are owned by the adapter for its lifetime and are never
// logged or echoed to callers.

use crate::domain::error::GatewayError;

fn required_env(name: &str) -> Result<String, GatewayError> {
    std::env::var(name).map_err(|_| {
        GatewayError::Configuration(format!("{name} environment variable is not set."))
    })
}

#[derive(Clone)]
pub struct OpenAiCredentials {
    pub api_key: String,
    pub endpoint: String,
}

impl OpenAiCredentials {
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.openai.com/v1";

    pub fn from_env() -> Result<Self, GatewayError> {
        Ok(Self {
            api_key: required_env("OPENAI_API_KEY")?,
            endpoint: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| Self::DEFAULT_ENDPOINT.to_string()),
        })
    }
}

#[derive(Clone)]
pub struct AzureOpenAiCredentials {
    pub api_key: String,
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    pub endpoint: String,
    pub api_version: String,
}

impl AzureOpenAiCredentials {
    pub const DEFAULT_API_VERSION: &'static str = "2024-10-21";

    pub fn from_env() -> Result<Self, GatewayError> {
        Ok(Self {
            api_key: required_env("AZURE_OPENAI_API_KEY")?,
            endpoint: required_env("AZURE_OPENAI_ENDPOINT")?,
            api_version: std::env::var("AZURE_OPENAI_API_VERSION")
                .unwrap_or_else(|_| Self::DEFAULT_API_VERSION.to_string()),
        })
    }
}

#[derive(Clone)]
pub struct AnthropicCredentials {
    pub api_key: String,
    pub endpoint: String,
}

impl AnthropicCredentials {
    pub const DEFAULT_ENDPOINT: &'static str = "https://api.anthropic.com";

    pub fn from_env() -> Result<Self, GatewayError> {
        Ok(Self {
            api_key: required_env("ANTHROPIC_API_KEY")?,
            endpoint: std::env::var("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|_| Self::DEFAULT_ENDPOINT.to_string()),
        })
    }
}

#[derive(Clone)]
pub struct BedrockCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    /// Bedrock runtime endpoint; derived from the region unless
    /// overridden (tests point this at a local server).
    pub endpoint: String,
}

impl BedrockCredentials {
    pub const DEFAULT_REGION: &'static str = "us-east-1";

    pub fn from_env() -> Result<Self, GatewayError> {
        let region = std::env::var("AWS_REGION")
            .unwrap_or_else(|_| Self::DEFAULT_REGION.to_string());
        let endpoint = std::env::var("AWS_BEDROCK_ENDPOINT")
            .unwrap_or_else(|_| format!("https://bedrock-runtime.{region}.amazonaws.com"));
        Ok(Self {
            access_key_id: required_env("AWS_ACCESS_KEY_ID")?,
            secret_access_key: required_env("AWS_SECRET_ACCESS_KEY")?,
            region,
            endpoint,
        })
    }
}
