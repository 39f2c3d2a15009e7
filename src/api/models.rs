//! API request and response models.

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Body of `POST /`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "diff": "diff --git a/README.md b/README.md\n+Install with cargo",
    "provider": "openai",
    "apiKey": "sk-..."
}))]
pub struct GenerateRequest {
    /// Unified diff of the changes to describe
    #[serde(default, deserialize_with = "null_as_empty")]
    pub diff: String,

    /// `openai` or `gemini`; the server default when omitted or empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Caller-supplied provider key, used instead of the server's key
    #[serde(default, rename = "apiKey", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

// `null` reads as an empty diff, which is then rejected as empty.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// The single-field envelope used by every message-shaped response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({"message": "feat(auth): add token refresh"}))]
pub struct MessageBody {
    pub message: String,
}
