//! Upstream LLM provider clients.
//!
//! Both supported providers speak the OpenAI chat-completions wire format, so
//! the request/response shapes and the single-call exchange live here. The
//! per-provider modules only pin the endpoint, model, and credentials.

pub mod gemini;
pub mod openai;

pub use gemini::GeminiClient;
pub use openai::OpenAiClient;

use crate::core::logging::{get_provider_context, PROVIDER_CONTEXT};
use crate::core::metrics::record_upstream_call;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Instant;
use thiserror::Error;

/// System instruction sent with every diff.
pub const COMMIT_PROMPT: &str = "You write git commit messages. The user message is a unified diff of staged and committed changes. Reply with exactly one line and nothing else.

Rules:
1. Use the form `type: subject` or `type(scope): subject`. Add a scope only when it makes the change clearer and the line still fits.
2. The whole line, type and scope included, is at most 72 characters.
3. Write the subject in the present tense and the imperative mood.
4. Start the subject with a capital letter.
5. Do not end the line with a period.
6. Write in English only.

Pick the type from this list:
- feat: a new feature
- fix: a bug fix
- docs: documentation only
- style: formatting or whitespace, no change in meaning
- refactor: restructuring that neither fixes a bug nor adds a feature
- perf: a performance improvement
- test: adding or correcting tests
- build: build system or external dependencies
- ci: CI configuration and scripts
- chore: anything else that leaves source and tests untouched
- revert: reverting an earlier commit

Use file extensions in the diff to judge the kind of change (for example .md is documentation, .yml is configuration, test.* and spec.* are tests). Describe why the change was made rather than how, be specific, and avoid repeating information.

Examples:
feat(auth): Add user authentication feature
fix(api): Resolve null pointer exception in login process
docs: Update API endpoints documentation
perf: Optimize database query for faster results

Respond with the commit message only: no quotes, no explanation, no extra lines.";

/// Sampling temperature for every upstream request.
pub const TEMPERATURE: f32 = 0.7;

/// Output-token ceiling for every upstream request.
pub const MAX_TOKENS: u32 = 200;

/// Build the connection-pooled HTTP client shared by both providers.
///
/// No request timeout is set; an upstream call lasts as long as the
/// transport allows.
pub fn build_http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("commit-server/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// The set of known providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAi,
    Gemini,
}

impl ProviderKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
        }
    }

    /// Parse a client-supplied provider name. Matching is exact.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "openai" => Some(Self::OpenAi),
            "gemini" => Some(Self::Gemini),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-success response from an upstream provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct UpstreamError {
    pub status_code: u16,
    pub message: String,
}

/// Failure of a single generation call.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Upstream answered with a non-2xx status
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Upstream answered 2xx with an empty choice list
    #[error("no response from {0} api")]
    NoResponse(ProviderKind),

    /// Upstream answered 2xx with something that is not a completion
    #[error("invalid response from {provider} api: {reason}")]
    InvalidResponse {
        provider: ProviderKind,
        reason: String,
    },

    /// The request never produced an HTTP response
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl ProviderError {
    /// Short label used for the upstream outcome metric.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Upstream(_) => "upstream_error",
            Self::NoResponse(_) => "no_response",
            Self::InvalidResponse { .. } => "invalid_response",
            Self::Transport(_) => "transport_error",
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Option<Vec<Choice>>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// One OpenAI-compatible chat-completions endpoint with its credentials.
#[derive(Debug, Clone)]
pub(crate) struct ChatEndpoint {
    kind: ProviderKind,
    http_client: reqwest::Client,
    url: String,
    model: &'static str,
    api_key: String,
}

impl ChatEndpoint {
    pub(crate) fn new(
        kind: ProviderKind,
        http_client: reqwest::Client,
        url: String,
        model: &'static str,
        api_key: String,
    ) -> Self {
        Self {
            kind,
            http_client,
            url,
            model,
            api_key,
        }
    }

    pub(crate) fn url(&self) -> &str {
        &self.url
    }

    pub(crate) fn model(&self) -> &'static str {
        self.model
    }

    /// Send the diff upstream once and return the post-processed message.
    pub(crate) async fn complete(
        &self,
        diff: &str,
        api_key_override: Option<&str>,
    ) -> Result<String, ProviderError> {
        let api_key = resolve_api_key(api_key_override, &self.api_key);
        let payload = ChatCompletionRequest {
            model: self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: COMMIT_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: diff,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        PROVIDER_CONTEXT
            .scope(self.kind.as_str().to_string(), async move {
                tracing::debug!(
                    provider = %self.kind,
                    url = %self.url,
                    model = self.model,
                    diff_bytes = diff.len(),
                    key_override = api_key_override.is_some_and(|k| !k.trim().is_empty()),
                    "Sending chat completion request"
                );

                let start = Instant::now();
                let result = self.exchange(api_key, &payload).await;
                let elapsed = start.elapsed();

                match &result {
                    Ok(_) => tracing::debug!(
                        provider = %self.kind,
                        duration_ms = elapsed.as_millis() as u64,
                        "Chat completion succeeded"
                    ),
                    Err(e) => tracing::warn!(
                        provider = %self.kind,
                        duration_ms = elapsed.as_millis() as u64,
                        error = %e,
                        "Chat completion failed"
                    ),
                }
                record_upstream_call(
                    self.kind.as_str(),
                    result.as_ref().err().map_or("success", ProviderError::outcome),
                    elapsed,
                );

                result
            })
            .await
    }

    async fn exchange(
        &self,
        api_key: &str,
        payload: &ChatCompletionRequest<'_>,
    ) -> Result<String, ProviderError> {
        let response = self
            .http_client
            .post(&self.url)
            .bearer_auth(api_key)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let error = upstream_error(status.as_u16(), &body);
            tracing::debug!(
                provider = %get_provider_context(),
                status = error.status_code,
                message = %error.message,
                "Upstream returned an error status"
            );
            return Err(error.into());
        }

        parse_completion(self.kind, &body)
    }
}

/// Pick the caller-supplied key when it has content, else the configured one.
pub(crate) fn resolve_api_key<'a>(api_key_override: Option<&'a str>, configured: &'a str) -> &'a str {
    api_key_override
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .unwrap_or(configured)
}

fn upstream_error(status_code: u16, body: &[u8]) -> UpstreamError {
    let message = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")?
                .get("message")?
                .as_str()
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| format!("api error: status code {}", status_code));

    UpstreamError {
        status_code,
        message,
    }
}

fn parse_completion(kind: ProviderKind, body: &[u8]) -> Result<String, ProviderError> {
    let parsed: ChatCompletionResponse =
        serde_json::from_slice(body).map_err(|e| ProviderError::InvalidResponse {
            provider: kind,
            reason: e.to_string(),
        })?;

    let first = parsed
        .choices
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or(ProviderError::NoResponse(kind))?;

    let content = first
        .message
        .and_then(|m| m.content)
        .ok_or_else(|| ProviderError::InvalidResponse {
            provider: kind,
            reason: "first choice has no message content".to_string(),
        })?;

    Ok(content.trim().to_lowercase())
}

/// A concrete provider client, selected per request.
#[derive(Debug, Clone)]
pub enum ProviderClient {
    OpenAi(OpenAiClient),
    Gemini(GeminiClient),
}

impl ProviderClient {
    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::OpenAi(_) => ProviderKind::OpenAi,
            Self::Gemini(_) => ProviderKind::Gemini,
        }
    }

    /// Generate a commit message for `diff`.
    ///
    /// `api_key_override` replaces the configured provider key when it is
    /// non-empty after trimming.
    pub async fn generate(
        &self,
        diff: &str,
        api_key_override: Option<&str>,
    ) -> Result<String, ProviderError> {
        match self {
            Self::OpenAi(client) => client.generate(diff, api_key_override).await,
            Self::Gemini(client) => client.generate(diff, api_key_override).await,
        }
    }
}
