//! OpenAI chat-completions client.

use super::{ChatEndpoint, ProviderError, ProviderKind};
use crate::core::config::ProvidersConfig;

pub const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const OPENAI_MODEL: &str = "gpt-3.5-turbo";

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    endpoint: ChatEndpoint,
}

impl OpenAiClient {
    pub fn new(http_client: reqwest::Client, config: &ProvidersConfig) -> Self {
        Self {
            endpoint: ChatEndpoint::new(
                ProviderKind::OpenAi,
                http_client,
                config.openai_api_url.clone(),
                OPENAI_MODEL,
                config.openai_api_key.clone(),
            ),
        }
    }

    pub fn url(&self) -> &str {
        self.endpoint.url()
    }

    pub fn model(&self) -> &'static str {
        self.endpoint.model()
    }

    pub async fn generate(
        &self,
        diff: &str,
        api_key_override: Option<&str>,
    ) -> Result<String, ProviderError> {
        self.endpoint.complete(diff, api_key_override).await
    }
}
