// Provider Factory
//
// Maps a provider kind to its adapter instance. Resolution is a pure
// function of the kind; credentials are read from the process
// environment the first time a backend is needed, never at startup
// (not every deployment configures every backend). Instances are
// memoized per provider for the process lifetime - adapters carry only
// immutable credentials, so sharing is safe.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::info;

use crate::domain::error::GatewayError;
use crate::domain::llm::ChatProvider;
use crate::domain::model::ProviderKind;
use crate::infrastructure::llm::anthropic::AnthropicAdapter;
use crate::infrastructure::llm::azure_openai::AzureOpenAiAdapter;
use crate::infrastructure::llm::bedrock::BedrockAdapter;
use crate::infrastructure::llm::credentials::{
    AnthropicCredentials, AzureOpenAiCredentials, BedrockCredentials, OpenAiCredentials,
};
use crate::infrastructure::llm::openai::OpenAiAdapter;

/// Seam between the dispatch core and adapter construction; tests
/// substitute stub providers behind this trait.
pub trait ProviderSource: Send + Sync {
    fn provider_for(&self, kind: ProviderKind) -> Result<Arc<dyn ChatProvider>, GatewayError>;
}

/// Environment-backed factory with one memoized adapter per provider.
#[derive(Default)]
pub struct ProviderFactory {
    cache: DashMap<ProviderKind, Arc<dyn ChatProvider>>,
}

impl ProviderFactory {
    pub fn new() -> Self {
        Self::default()
    }

    fn build(kind: ProviderKind) -> Result<Arc<dyn ChatProvider>, GatewayError> {
        info!(provider = %kind, "Initializing provider adapter");
        let adapter: Arc<dyn ChatProvider> = match kind {
            ProviderKind::OpenAi => Arc::new(OpenAiAdapter::new(OpenAiCredentials::from_env()?)),
            ProviderKind::AzureOpenAi => {
                Arc::new(AzureOpenAiAdapter::new(AzureOpenAiCredentials::from_env()?))
            }
            ProviderKind::Anthropic => {
                Arc::new(AnthropicAdapter::new(AnthropicCredentials::from_env()?))
            }
            ProviderKind::Bedrock => Arc::new(BedrockAdapter::new(BedrockCredentials::from_env()?)),
        };
        Ok(adapter)
    }
}

impl ProviderSource for ProviderFactory {
    fn provider_for(&self, kind: ProviderKind) -> Result<Arc<dyn ChatProvider>, GatewayError> {
        if let Some(cached) = self.cache.get(&kind) {
            return Ok(cached.clone());
        }
        let adapter = Self::build(kind)?;
        self.cache.insert(kind, adapter.clone());
        Ok(adapter)
    }
}
