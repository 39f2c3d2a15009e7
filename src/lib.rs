//! Commit Server - generates conventional commit messages from diffs
//!
//! A small HTTP service: a client posts a unified diff to `POST /` and gets
//! back a one-line commit message written by an upstream LLM (OpenAI or
//! Gemini). Features:
//!
//! - **Provider dispatch**: per-request choice between OpenAI and Gemini,
//!   with a configurable default
//! - **Access guard**: IP allowlist, bypassed by callers that bring their own
//!   API key
//! - **Content negotiation**: JSON for tools and curl, HTML for browsers
//! - **Metrics & Monitoring**: Prometheus metrics for observability
//!
//! # Architecture
//!
//! - [`core`]: Core functionality (config, errors, logging, metrics, middleware)
//! - [`api`]: HTTP handlers, access guard, negotiation, and the router
//! - [`providers`]: Upstream chat-completion clients
//! - [`services`]: Provider selection
//!
//! # Configuration
//!
//! All settings come from environment variables (an optional `.env` file is
//! loaded first):
//! - `APP_PORT`: Server port (default: 80)
//! - `APP_IPS`: Comma-separated IP allowlist (default: `::1`)
//! - `APP_ENV`: Deployment environment (default: production)
//! - `OPENAI_API_KEY`, `GEMINI_API_KEY`: Server-side provider keys
//! - `DEFAULT_PROVIDER`: `openai` or `gemini` (default: gemini)

pub mod api;
pub mod core;
pub mod providers;
pub mod services;

// Re-export commonly used types for convenience
pub use api::{app_router, AppState, GenerateRequest, MessageBody};
pub use core::{AppConfig, AppError, Result};
pub use providers::{ProviderClient, ProviderError, ProviderKind};
pub use services::ProviderService;
