// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Model Catalog - caller-facing model ids and their routing defaults.
//
// The catalog is loaded once at startup from a JSON document and is
// read-only afterwards. A malformed catalog (missing field, duplicate
// modelId, unknown providerName) is a startup-fatal configuration error,
// never surfaced per-request.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::error::GatewayError;

/// The backend that serves a given model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    #[serde(rename = "OpenAI")]
    OpenAi,
    #[serde(rename = "Azure OpenAI")]
    AzureOpenAi,
    #[serde(rename = "Anthropic")]
    Anthropic,
    #[serde(rename = "AWS Bedrock")]
    Bedrock,
}

impl ProviderKind {
    /// Display name as it appears in the catalog and in responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::AzureOpenAi => "Azure OpenAI",
            ProviderKind::Anthropic => "Anthropic",
            ProviderKind::Bedrock => "AWS Bedrock",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One catalog record: a caller-facing model id plus routing defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    /// Unique caller-facing key. Lookup is case-sensitive exact match.
    pub model_id: String,

    /// Backend-specific identifier: a deployment name for Azure OpenAI,
    /// a model id elsewhere.
    pub model_name: String,

    #[serde(rename = "providerName")]
    pub provider: ProviderKind,

    /// Default sampling temperature. The contract has no per-request
    /// override; this value is always what the adapter receives.
    pub temperature: f32,

    pub supports_vision: bool,

    pub description: String,
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    models: Vec<ModelDescriptor>,
}

/// The Model Registry: loaded eagerly, immutable for the process lifetime.
#[derive(Debug)]
pub struct ModelCatalog {
    models: Vec<ModelDescriptor>,
    by_id: HashMap<String, usize>,
}

impl ModelCatalog {
    /// Build a catalog from descriptors, rejecting duplicate model ids.
    pub fn new(models: Vec<ModelDescriptor>) -> Result<Self, GatewayError> {
        let mut by_id = HashMap::with_capacity(models.len());
        for (idx, model) in models.iter().enumerate() {
            if by_id.insert(model.model_id.clone(), idx).is_some() {
                return Err(GatewayError::Configuration(format!(
                    "Duplicate modelId '{}' in model catalog",
                    model.model_id
                )));
            }
        }
        Ok(Self { models, by_id })
    }

    /// Parse a catalog document (`{"models": [...]}`) from a JSON string.
    pub fn from_json(raw: &str) -> Result<Self, GatewayError> {
        let doc: CatalogDocument = serde_json::from_str(raw)
            .map_err(|e| GatewayError::Configuration(format!("Invalid model catalog: {e}")))?;
        Self::new(doc.models)
    }

    /// Load and parse the catalog file. Fail-fast: any error here is
    /// fatal to startup.
    pub fn from_path(path: &Path) -> Result<Self, GatewayError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            GatewayError::Configuration(format!(
                "Cannot read model catalog '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_json(&raw)
    }

    /// All descriptors in catalog file order (stable).
    pub fn list(&self) -> &[ModelDescriptor] {
        &self.models
    }

    /// Look up a descriptor by its caller-facing id.
    pub fn get(&self, model_id: &str) -> Option<&ModelDescriptor> {
        self.by_id.get(model_id).map(|&idx| &self.models[idx])
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
