// Azure OpenAI Provider Adapter
//
// Same chat-completion wire shape as OpenAI; differs only in endpoint
// construction (resource endpoint + deployment name + api-version query
// parameter) and the `api-key` authentication header. In Azure the
// model name from the catalog is the deployment name.

use async_trait::async_trait;
use tracing::info;

use crate::domain::error::GatewayError;
use crate::domain::llm::{require_prompt, ChatProvider, ImageAttachment};
use crate::domain::model::ProviderKind;
use crate::infrastructure::llm::credentials::AzureOpenAiCredentials;
use crate::infrastructure::llm::openai::{
    extract_text, user_messages, ChatCompletionRequest, ChatCompletionResponse,
};
use crate::infrastructure::llm::upstream_failure;

pub struct AzureOpenAiAdapter {
    client: reqwest::Client,
    credentials: AzureOpenAiCredentials,
}

impl AzureOpenAiAdapter {
    pub fn new(credentials: AzureOpenAiCredentials) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
        }
    }

    fn deployment_url(&self, deployment: &str) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions",
            self.credentials.endpoint.trim_end_matches('/'),
            deployment
        )
    }

    async fn chat(
        &self,
        deployment: &str,
        request: &ChatCompletionRequest,
    ) -> Result<String, GatewayError> {
        let response = self
            .client
            .post(self.deployment_url(deployment))
            .query(&[("api-version", self.credentials.api_version.as_str())])
            .header("api-key", &self.credentials.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| GatewayError::upstream(ProviderKind::AzureOpenAi, e.to_string()))?;

        if !response.status().is_success() {
            return Err(upstream_failure(ProviderKind::AzureOpenAi, response).await);
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            GatewayError::upstream(
                ProviderKind::AzureOpenAi,
                format!("Failed to parse response: {e}"),
            )
        })?;

        extract_text(ProviderKind::AzureOpenAi, parsed)
    }
}

#[async_trait]
impl ChatProvider for AzureOpenAiAdapter {
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, GatewayError> {
        require_prompt(prompt)?;
        info!(deployment = model, temperature, "Azure OpenAI text generation");

        self.chat(
            model,
            &ChatCompletionRequest {
                model: model.to_string(),
                messages: user_messages(prompt, None),
                temperature,
            },
        )
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
        info!(deployment = model, temperature, "Azure OpenAI vision generation");

        self.chat(
            model,
            &ChatCompletionRequest {
                model: model.to_string(),
                messages: user_messages(prompt, Some(image)),
                temperature,
            },
        )
        .await
    }
}
