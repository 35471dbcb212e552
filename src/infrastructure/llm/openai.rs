// OpenAI Provider Adapter
//
// Anti-Corruption Layer for the OpenAI Chat Completions API.
// The Azure adapter reuses these wire types; the two differ only in
// endpoint construction and authentication header.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::error::GatewayError;
use crate::domain::llm::{require_prompt, ChatProvider, ImageAttachment};
use crate::domain::model::ProviderKind;
use crate::infrastructure::llm::credentials::OpenAiCredentials;
use crate::infrastructure::llm::upstream_failure;

pub struct OpenAiAdapter {
    client: reqwest::Client,
    credentials: OpenAiCredentials,
}

#[derive(Serialize)]
pub(crate) struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<RequestMessage>,
    pub temperature: f32,
}

#[derive(Serialize)]
pub(crate) struct RequestMessage {
    pub role: &'static str,
    pub content: MessageContent,
}

/// OpenAI accepts either a plain string or an array of typed content
/// parts; the array form carries vision input.
#[derive(Serialize)]
#[serde(untagged)]
pub(crate) enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Serialize)]
#[serde(tag = "type")]
pub(crate) enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
pub(crate) struct ImageUrl {
    pub url: String,
}

#[derive(Deserialize)]
pub(crate) struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Deserialize)]
pub(crate) struct Choice {
    pub message: ResponseMessage,
}

#[derive(Deserialize)]
pub(crate) struct ResponseMessage {
    pub content: Option<String>,
}

/// Build the user message list for a text or text+image request.
pub(crate) fn user_messages(prompt: &str, image: Option<&ImageAttachment>) -> Vec<RequestMessage> {
    let content = match image {
        None => MessageContent::Text(prompt.to_string()),
        Some(image) => MessageContent::Parts(vec![
            ContentPart::Text {
                text: prompt.to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: image.as_openai_url(),
                },
            },
        ]),
    };
    vec![RequestMessage {
        role: "user",
        content,
    }]
}

/// Pull the generated text out of a chat-completion response.
pub(crate) fn extract_text(
    backend: ProviderKind,
    response: ChatCompletionResponse,
) -> Result<String, GatewayError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| GatewayError::upstream(backend, "No response from model"))
}

impl OpenAiAdapter {
    pub fn new(credentials: OpenAiCredentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
        }
    }

    async fn chat(&self, request: &ChatCompletionRequest) -> Result<String, GatewayError> {
        let url = format!(
            "{}/chat/completions",
            self.credentials.endpoint.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.credentials.api_key),
            )
            .json(request)
            .send()
            .await
            .map_err(|e| GatewayError::upstream(ProviderKind::OpenAi, e.to_string()))?;

        if !response.status().is_success() {
            return Err(upstream_failure(ProviderKind::OpenAi, response).await);
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            GatewayError::upstream(ProviderKind::OpenAi, format!("Failed to parse response: {e}"))
        })?;

        extract_text(ProviderKind::OpenAi, parsed)
    }
}

#[async_trait]
impl ChatProvider for OpenAiAdapter {
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, GatewayError> {
        require_prompt(prompt)?;
        info!(model, temperature, "OpenAI text generation");

        self.chat(&ChatCompletionRequest {
            model: model.to_string(),
            messages: user_messages(prompt, None),
            temperature,
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
        info!(model, temperature, "OpenAI vision generation");

        self.chat(&ChatCompletionRequest {
            model: model.to_string(),
            messages: user_messages(prompt, Some(image)),
            temperature,
        })
        .await
    }
}
