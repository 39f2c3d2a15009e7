//! Gemini client, using Google's OpenAI-compatible chat-completions surface.

use super::{ChatEndpoint, ProviderError, ProviderKind};
use crate::core::config::ProvidersConfig;

pub const GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions";
pub const GEMINI_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Clone)]
pub struct GeminiClient {
    endpoint: ChatEndpoint,
}

impl GeminiClient {
    pub fn new(http_client: reqwest::Client, config: &ProvidersConfig) -> Self {
        Self {
            endpoint: ChatEndpoint::new(
                ProviderKind::Gemini,
                http_client,
                config.gemini_api_url.clone(),
                GEMINI_MODEL,
                config.gemini_api_key.clone(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        matchers::{body_partial_json, header, method},
        Mock, MockServer, ResponseTemplate,
    };

    fn config_for(server: &MockServer) -> ProvidersConfig {
        ProvidersConfig {
            gemini_api_key: "gm-server".to_string(),
            gemini_api_url: format!("{}/v1beta/openai/chat/completions", server.uri()),
            ..ProvidersConfig::default()
        }
    }

    #[test]
    fn test_default_endpoint() {
        let client = GeminiClient::new(reqwest::Client::new(), &ProvidersConfig::default());
        assert_eq!(client.url(), GEMINI_API_URL);
        assert_eq!(client.model(), "gemini-2.0-flash");
    }

    #[tokio::test]
    async fn test_generate_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer gm-server"))
            .and(body_partial_json(json!({"model": "gemini-2.0-flash"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "refactor(core): Simplify config loading"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::new(reqwest::Client::new(), &config_for(&server));
        let message = client.generate("diff", Some("  ")).await.unwrap();
        assert_eq!(message, "refactor(core): simplify config loading");
    }

    #[tokio::test]
    async fn test_generate_generic_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::new(reqwest::Client::new(), &config_for(&server));
        let err = client.generate("diff", None).await.unwrap_err();
        assert_eq!(err.to_string(), "api error: status code 502");
    }

    #[tokio::test]
    async fn test_generate_no_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::new(reqwest::Client::new(), &config_for(&server));
        let err = client.generate("diff", None).await.unwrap_err();
        assert_eq!(err.to_string(), "no response from gemini api");
    }
}
