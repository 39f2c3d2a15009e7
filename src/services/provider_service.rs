//! Provider selection.
//!
//! Both clients are built once at startup from the immutable configuration
//! and shared by every request; selection is a pure lookup.

use crate::core::config::ProvidersConfig;
use crate::providers::{GeminiClient, OpenAiClient, ProviderClient, ProviderKind};

#[derive(Debug, Clone)]
pub struct ProviderService {
    openai: ProviderClient,
    gemini: ProviderClient,
    default: ProviderKind,
}

impl ProviderService {
    /// Build both provider clients on top of one shared HTTP client.
    pub fn new(config: &ProvidersConfig, http_client: reqwest::Client) -> Self {
        Self {
            openai: ProviderClient::OpenAi(OpenAiClient::new(http_client.clone(), config)),
            gemini: ProviderClient::Gemini(GeminiClient::new(http_client, config)),
            default: config.default_provider,
        }
    }

    pub fn default_provider(&self) -> ProviderKind {
        self.default
    }

    /// Map a requested provider to its client; `None` means the default.
    pub fn select(&self, requested: Option<ProviderKind>) -> &ProviderClient {
        match requested.unwrap_or(self.default) {
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::Gemini => &self.gemini,
        }
    }
}
