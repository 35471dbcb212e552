// Anthropic Provider Adapter
//
// Anti-Corruption Layer for the Anthropic Messages API. The chat shape
// differs from OpenAI's (separate messages framing, content blocks);
// vision input uses a content block with an explicit source type of
// "base64" or "url".

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::error::GatewayError;
use crate::domain::llm::{require_prompt, ChatProvider, ImageAttachment, ImageSource};
use crate::domain::model::ProviderKind;
use crate::infrastructure::llm::credentials::AnthropicCredentials;
use crate::infrastructure::llm::upstream_failure;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;

pub struct AnthropicAdapter {
    client: reqwest::Client,
    credentials: AnthropicCredentials,
}

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: MessageContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image")]
    Image { source: ImageBlockSource },
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ImageBlockSource {
    #[serde(rename = "base64")]
    Base64 {
        media_type: &'static str,
        data: String,
    },
    #[serde(rename = "url")]
    Url { url: String },
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

impl AnthropicAdapter {
    pub fn new(credentials: AnthropicCredentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
        }
    }

    fn image_block(image: &ImageAttachment) -> ContentBlock {
        let source = match &image.source {
            ImageSource::Url(url) => ImageBlockSource::Url { url: url.clone() },
            ImageSource::Base64(data) => ImageBlockSource::Base64 {
                media_type: image.media_type.mime(),
                data: data.clone(),
            },
        };
        ContentBlock::Image { source }
    }

    async fn send(&self, request: &MessagesRequest) -> Result<String, GatewayError> {
        let url = format!(
            "{}/v1/messages",
            self.credentials.endpoint.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.credentials.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(request)
            .send()
            .await
            .map_err(|e| GatewayError::upstream(ProviderKind::Anthropic, e.to_string()))?;

        if !response.status().is_success() {
            return Err(upstream_failure(ProviderKind::Anthropic, response).await);
        }

        let parsed: MessagesResponse = response.json().await.map_err(|e| {
            GatewayError::upstream(
                ProviderKind::Anthropic,
                format!("Failed to parse response: {e}"),
            )
        })?;

        // The response is a sequence of content blocks; the generated
        // text is the concatenation of the text-typed ones.
        Ok(parsed
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .map(|block| block.text)
            .collect())
    }
}

#[async_trait]
impl ChatProvider for AnthropicAdapter {
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, GatewayError> {
        require_prompt(prompt)?;
        info!(model, temperature, "Anthropic text generation");

        self.send(&MessagesRequest {
            model: model.to_string(),
            max_tokens: MAX_TOKENS,
            temperature,
            messages: vec![Message {
                role: "user",
                content: MessageContent::Text(prompt.to_string()),
            }],
        })
        .await
    }

    async fn complete_with_image(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
        image: &ImageAttachment,
    ) -> Result<String, GatewayError> {
        require_prompt(prompt)?;
        info!(model, temperature, "Anthropic vision generation");

        self.send(&MessagesRequest {
            model: model.to_string(),
            max_tokens: MAX_TOKENS,
            temperature,
            messages: vec![Message {
                role: "user",
                content: MessageContent::Blocks(vec![
                    Self::image_block(image),
                    ContentBlock::Text {
                        text: prompt.to_string(),
                    },
                ]),
            }],
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::ImageMediaType;

    fn adapter(endpoint: String) -> AnthropicAdapter {
        AnthropicAdapter::new(AnthropicCredentials {
            api_key: "anthropic-key".into(),
            endpoint,
        })
    }

    #[tokio::test]
    async fn test_complete_concatenates_text_blocks() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "anthropic-key")
            .match_header("anthropic-version", ANTHROPIC_VERSION)
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "model": "claude-sonnet-4-20250514",
                "max_tokens": 4096,
                "messages": [{"role": "user", "content": "hi"}]
            })))
            .with_status(200)
            .with_body(
                r#"{"content":[{"type":"text","text":"Hello"},{"type":"tool_use","id":"x"},{"type":"text","text":" there"}]}"#,
            )
            .create_async()
            .await;

        let text = adapter(server.url())
            .complete("claude-sonnet-4-20250514", "hi", 0.7)
            .await
            .unwrap();
        assert_eq!(text, "Hello there");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_vision_base64_source_block() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "messages": [{"role": "user", "content": [
                    {"type": "image", "source": {
                        "type": "base64",
                        "media_type": "image/webp",
                        "data": "abc123"
                    }},
                    {"type": "text", "text": "describe"}
                ]}]
            })))
            .with_status(200)
            .with_body(r#"{"content":[{"type":"text","text":"a dog"}]}"#)
            .create_async()
            .await;

        let image = ImageAttachment::new("abc123", ImageMediaType::Webp);
        let text = adapter(server.url())
            .complete_with_image("claude-sonnet-4-20250514", "describe", 0.3, &image)
            .await
            .unwrap();
        assert_eq!(text, "a dog");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_vision_url_source_block() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "messages": [{"role": "user", "content": [
                    {"type": "image", "source": {
                        "type": "url",
                        "url": "https://example.com/dog.png"
                    }},
                    {"type": "text", "text": "describe"}
                ]}]
            })))
            .with_status(200)
            .with_body(r#"{"content":[{"type":"text","text":"a dog"}]}"#)
            .create_async()
            .await;

        let image = ImageAttachment::new("https://example.com/dog.png", ImageMediaType::Png);
        adapter(server.url())
            .complete_with_image("claude-sonnet-4-20250514", "describe", 0.3, &image)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_upstream() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/messages")
            .with_status(429)
            .with_body(r#"{"error":{"type":"rate_limit_error"}}"#)
            .create_async()
            .await;

        let err = adapter(server.url())
            .complete("claude-sonnet-4-20250514", "hi", 0.7)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Upstream {
                backend: ProviderKind::Anthropic,
                ..
            }
        ));
    }
}
