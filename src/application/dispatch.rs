// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Dispatch Core
//
// Orchestrates one inbound chat/vision request: resolve the model id in
// the catalog, gate on capability, obtain the adapter from the factory,
// invoke it, and normalize the outcome. No retries; the first failure
// is the final answer, and no partial results are ever returned.

use std::sync::Arc;

use tracing::error;

use crate::domain::error::GatewayError;
use crate::domain::llm::{ImageAttachment, ImageMediaType};
use crate::domain::model::{ModelCatalog, ModelDescriptor, ProviderKind};
use crate::infrastructure::llm::ProviderSource;

/// A normalized backend response, echoing which model and provider
/// actually served the request.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub response: String,
    pub model_id: String,
    pub provider: ProviderKind,
}

pub struct DispatchService {
    catalog: Arc<ModelCatalog>,
    providers: Arc<dyn ProviderSource>,
}

impl DispatchService {
    pub fn new(catalog: Arc<ModelCatalog>, providers: Arc<dyn ProviderSource>) -> Self {
        Self { catalog, providers }
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    fn resolve(&self, model_id: &str) -> Result<&ModelDescriptor, GatewayError> {
        if model_id.is_empty() {
            return Err(GatewayError::InvalidInput(
                "Field 'modelId' is required.".into(),
            ));
        }
        self.catalog
            .get(model_id)
            .ok_or_else(|| GatewayError::ModelNotFound(model_id.to_string()))
    }

    fn require_prompt(prompt: &str) -> Result<(), GatewayError> {
        if prompt.is_empty() {
            return Err(GatewayError::InvalidInput(
                "Field 'prompt' is required.".into(),
            ));
        }
        Ok(())
    }

    /// Handle a text-only chat request.
    pub async fn chat(&self, prompt: &str, model_id: &str) -> Result<ChatOutcome, GatewayError> {
        Self::require_prompt(prompt)?;
        let descriptor = self.resolve(model_id)?;
        let provider = self.providers.provider_for(descriptor.provider)?;

        let response = provider
            .complete(&descriptor.model_name, prompt, descriptor.temperature)
            .await
            .inspect_err(|e| error!(model_id, %e, "Text generation failed"))?;

        Ok(ChatOutcome {
            response,
            model_id: descriptor.model_id.clone(),
            provider: descriptor.provider,
        })
    }

    /// Handle a text + image chat request. The vision gate runs before
    /// any backend call so unsupported requests are rejected cheaply;
    /// adapters re-check as the final authority.
    pub async fn vision_chat(
        &self,
        prompt: &str,
        model_id: &str,
        image_content: &str,
        image_media_type: Option<&str>,
    ) -> Result<ChatOutcome, GatewayError> {
        Self::require_prompt(prompt)?;
        if image_content.is_empty() {
            return Err(GatewayError::InvalidInput(
                "Field 'imageContent' is required.".into(),
            ));
        }
        let descriptor = self.resolve(model_id)?;
        if !descriptor.supports_vision {
            return Err(GatewayError::InvalidInput(format!(
                "Model '{model_id}' does not support vision/image input."
            )));
        }
        let media_type = ImageMediaType::parse(image_media_type)?;
        let image = ImageAttachment::new(image_content, media_type);

        let provider = self.providers.provider_for(descriptor.provider)?;
        let response = provider
            .complete_with_image(&descriptor.model_name, prompt, descriptor.temperature, &image)
            .await
            .inspect_err(|e| error!(model_id, %e, "Vision generation failed"))?;

        Ok(ChatOutcome {
            response,
            model_id: descriptor.model_id.clone(),
            provider: descriptor.provider,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::ChatProvider;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubProvider {
        reply: Result<String, fn() -> GatewayError>,
        calls: AtomicUsize,
    }

    impl StubProvider {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(make: fn() -> GatewayError) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(make),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn answer(&self) -> Result<String, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    #[async_trait]
    impl ChatProvider for StubProvider {
        async fn complete(
            &self,
            _model: &str,
            _prompt: &str,
            _temperature: f32,
        ) -> Result<String, GatewayError> {
            self.answer()
        }

        async fn complete_with_image(
            &self,
            _model: &str,
            _prompt: &str,
            _temperature: f32,
            _image: &ImageAttachment,
        ) -> Result<String, GatewayError> {
            self.answer()
        }
    }

    struct StubSource(Arc<StubProvider>);

    impl ProviderSource for StubSource {
        fn provider_for(
            &self,
            _kind: ProviderKind,
        ) -> Result<Arc<dyn ChatProvider>, GatewayError> {
            Ok(self.0.clone())
        }
    }

    fn catalog() -> Arc<ModelCatalog> {
        Arc::new(
            ModelCatalog::new(vec![
                ModelDescriptor {
                    model_id: "openai-gpt4o".into(),
                    model_name: "gpt-4o".into(),
                    provider: ProviderKind::OpenAi,
                    temperature: 0.7,
                    supports_vision: true,
                    description: "GPT-4o".into(),
                },
                ModelDescriptor {
                    model_id: "bedrock-llama3".into(),
                    model_name: "meta.llama3-70b-instruct-v1:0".into(),
                    provider: ProviderKind::Bedrock,
                    temperature: 0.5,
                    supports_vision: false,
                    description: "Llama 3".into(),
                },
            ])
            .unwrap(),
        )
    }

    fn service(stub: Arc<StubProvider>) -> DispatchService {
        DispatchService::new(catalog(), Arc::new(StubSource(stub)))
    }

    #[tokio::test]
    async fn test_chat_round_trip_echoes_model_and_provider() {
        let stub = StubProvider::replying("hello");
        let outcome = service(stub.clone())
            .chat("hi", "openai-gpt4o")
            .await
            .unwrap();
        assert_eq!(outcome.response, "hello");
        assert_eq!(outcome.model_id, "openai-gpt4o");
        assert_eq!(outcome.provider, ProviderKind::OpenAi);
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_model_is_not_found_without_a_call() {
        let stub = StubProvider::replying("hello");
        let err = service(stub.clone()).chat("hi", "nope").await.unwrap_err();
        assert!(matches!(err, GatewayError::ModelNotFound(_)));
        assert!(err.to_string().contains("nope"));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_fields_are_invalid_input() {
        let stub = StubProvider::replying("hello");
        let svc = service(stub.clone());

        assert!(matches!(
            svc.chat("", "openai-gpt4o").await.unwrap_err(),
            GatewayError::InvalidInput(_)
        ));
        assert!(matches!(
            svc.chat("hi", "").await.unwrap_err(),
            GatewayError::InvalidInput(_)
        ));
        assert!(matches!(
            svc.vision_chat("hi", "openai-gpt4o", "", None)
                .await
                .unwrap_err(),
            GatewayError::InvalidInput(_)
        ));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_vision_gate_rejects_before_any_backend_call() {
        let stub = StubProvider::replying("hello");
        let err = service(stub.clone())
            .vision_chat("hi", "bedrock-llama3", "aGVsbG8=", None)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidInput(_)));
        assert!(err.to_string().contains("does not support vision"));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_media_type_rejected_before_dispatch() {
        let stub = StubProvider::replying("hello");
        let err = service(stub.clone())
            .vision_chat("hi", "openai-gpt4o", "aGVsbG8=", Some("image/bmp"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidInput(_)));
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn test_upstream_failure_propagates_unchanged() {
        let stub = StubProvider::failing(|| {
            GatewayError::upstream(ProviderKind::OpenAi, "connection timed out")
        });
        let err = service(stub.clone())
            .chat("hi", "openai-gpt4o")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Upstream { .. }));
        assert_eq!(stub.calls(), 1);
    }
}
