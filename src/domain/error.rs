// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::model::ProviderKind;

/// Errors that can occur anywhere in the dispatch chain.
///
/// Adapters never let a backend-native error cross their boundary
/// unwrapped; everything is folded into this taxonomy before it reaches
/// the dispatch core.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Missing or malformed caller input, including vision requests
    /// against non-vision models and unsupported image MIME types.
    #[error("{0}")]
    InvalidInput(String),

    /// The caller-supplied model id does not resolve in the catalog.
    #[error("Model '{0}' not found.")]
    ModelNotFound(String),

    /// Required backend credentials are absent, or the catalog itself is
    /// malformed (the latter is fatal at startup, never per-request).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Any failure reported by the backend provider: auth rejection,
    /// rate limit, malformed response, network failure. The original
    /// backend message is preserved for diagnostics.
    #[error("{backend} error: {message}")]
    Upstream {
        backend: ProviderKind,
        message: String,
    },

    /// Adapter-level refusal: the bound model cannot serve the requested
    /// modality even though the descriptor claims otherwise.
    #[error("Model '{model}' does not support image/vision input.")]
    UnsupportedCapability { model: String },
}

impl GatewayError {
    pub fn upstream(backend: ProviderKind, message: impl Into<String>) -> Self {
        Self::Upstream {
            backend,
            message: message.into(),
        }
    }
}
