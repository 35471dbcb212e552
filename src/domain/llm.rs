// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Chat Provider Domain Interface (Anti-Corruption Layer)
//
// Defines the capability contract every backend adapter satisfies,
// isolating the dispatch core from vendor wire formats and SDKs.
//
// Implementations in infrastructure/llm/ directory.

use async_trait::async_trait;

use crate::domain::error::GatewayError;

/// Capability contract for one LLM backend.
///
/// The backend-specific model name is a per-call parameter: the factory
/// memoizes one adapter per provider, and that instance serves every
/// catalog descriptor routed to it. Adapters hold only immutable
/// credentials and a shared HTTP client, so concurrent use is safe.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Generate a text response from a text-only prompt.
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, GatewayError>;

    /// Generate a text response from a text + image prompt.
    ///
    /// Fails with `UnsupportedCapability` when the bound model family
    /// cannot accept images, even if the catalog descriptor says it can.
    async fn complete_with_image(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
        image: &ImageAttachment,
    ) -> Result<String, GatewayError>;
}

/// Guard shared by all adapters: the contract rejects empty prompts.
pub fn require_prompt(prompt: &str) -> Result<(), GatewayError> {
    if prompt.trim().is_empty() {
        return Err(GatewayError::InvalidInput(
            "Field 'prompt' is required.".into(),
        ));
    }
    Ok(())
}

/// Normalized image input, shared by all adapters.
///
/// Each backend encodes images differently, but the base64-vs-URL
/// branching is identical everywhere; it lives here once so the four
/// adapters cannot diverge on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Base64-encoded image bytes.
    Base64(String),
    /// A remote image URL, passed through verbatim where supported.
    Url(String),
}

impl ImageSource {
    /// Classify raw `imageContent` by prefix inspection: anything
    /// starting with `http` is a URL, everything else is base64 data.
    pub fn detect(content: &str) -> Self {
        if content.starts_with("http") {
            ImageSource::Url(content.to_string())
        } else {
            ImageSource::Base64(content.to_string())
        }
    }
}

/// Supported image MIME types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageMediaType {
    #[default]
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageMediaType {
    /// Parse a caller-supplied MIME string; `None` defaults to PNG.
    pub fn parse(value: Option<&str>) -> Result<Self, GatewayError> {
        match value {
            None => Ok(Self::Png),
            Some("image/png") => Ok(Self::Png),
            Some("image/jpeg") => Ok(Self::Jpeg),
            Some("image/gif") => Ok(Self::Gif),
            Some("image/webp") => Ok(Self::Webp),
            Some(other) => Err(GatewayError::InvalidInput(format!(
                "Unsupported imageMediaType '{other}'. Supported: image/png, image/jpeg, image/gif, image/webp."
            ))),
        }
    }

    /// MIME string, as used by the OpenAI-style data URI and Anthropic's
    /// `media_type` field.
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
        }
    }

}

/// An image plus its media type, as handed to adapters by the dispatch
/// core after validation.
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    pub source: ImageSource,
    pub media_type: ImageMediaType,
}

impl ImageAttachment {
    pub fn new(content: &str, media_type: ImageMediaType) -> Self {
        Self {
            source: ImageSource::detect(content),
            media_type,
        }
    }

    /// OpenAI-style image reference: URLs pass through verbatim, base64
    /// data becomes a `data:` URI carrying the media type.
    pub fn as_openai_url(&self) -> String {
        match &self.source {
            ImageSource::Url(url) => url.clone(),
            ImageSource::Base64(data) => {
                format!("data:{};base64,{}", self.media_type.mime(), data)
            }
        }
    }
}
