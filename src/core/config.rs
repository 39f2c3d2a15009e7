//! Configuration management for the commit server.
//!
//! Configuration is read once from the process environment at startup (after
//! an optional `.env` file is loaded) and is immutable afterwards.

use crate::providers::gemini::GEMINI_API_URL;
use crate::providers::openai::OPENAI_API_URL;
use crate::providers::ProviderKind;
use anyhow::{Context, Result};
use std::fmt;
use std::str::FromStr;

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    pub server: ServerConfig,

    /// Upstream provider credentials and endpoints
    pub providers: ProvidersConfig,

    /// Comma-separated list of client IPs allowed without an API key
    pub allowed_ips: String,

    /// Maximum accepted request body size in bytes
    pub max_body_bytes: usize,

    /// Seconds in-flight requests get to finish after a shutdown signal
    pub shutdown_grace_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            providers: ProvidersConfig::default(),
            allowed_ips: default_allowed_ips(),
            max_body_bytes: default_max_body_bytes(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

/// Server-specific configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Deployment environment name ("production", "development", ...)
    pub env: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            env: default_env(),
        }
    }
}

impl ServerConfig {
    pub fn is_production(&self) -> bool {
        self.env == "production"
    }
}

/// Credentials and endpoints for the upstream LLM providers.
#[derive(Clone)]
pub struct ProvidersConfig {
    pub openai_api_key: String,
    pub gemini_api_key: String,
    pub openai_api_url: String,
    pub gemini_api_url: String,

    /// Provider used when a request names none
    pub default_provider: ProviderKind,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            gemini_api_key: String::new(),
            openai_api_url: OPENAI_API_URL.to_string(),
            gemini_api_url: GEMINI_API_URL.to_string(),
            default_provider: ProviderKind::Gemini,
        }
    }
}

// Keys never reach the logs.
impl fmt::Debug for ProvidersConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvidersConfig")
            .field("openai_api_key", &mask(&self.openai_api_key))
            .field("gemini_api_key", &mask(&self.gemini_api_key))
            .field("openai_api_url", &self.openai_api_url)
            .field("gemini_api_url", &self.gemini_api_url)
            .field("default_provider", &self.default_provider)
            .finish()
    }
}

fn mask(key: &str) -> &'static str {
    if key.is_empty() {
        "<unset>"
    } else {
        "***"
    }
}

// Dual-stack, so both `::1` and IPv4 peers can reach the default allowlist.
fn default_host() -> String {
    "::".to_string()
}

fn default_port() -> u16 {
    80
}

fn default_env() -> String {
    "production".to_string()
}

fn default_allowed_ips() -> String {
    "::1".to_string()
}

fn default_max_body_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_shutdown_grace_secs() -> u64 {
    30
}

impl AppConfig {
    /// Build the configuration from environment variables.
    ///
    /// Unset variables fall back to defaults; a variable that is set but does
    /// not parse is an error.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use commit_server::core::config::AppConfig;
    ///
    /// let config = AppConfig::from_env().expect("invalid configuration");
    /// println!("listening on port {}", config.server.port);
    /// ```
    pub fn from_env() -> Result<Self> {
        let server = ServerConfig {
            host: env_string("HOST", default_host()),
            port: env_parse("APP_PORT", default_port())?,
            env: env_string("APP_ENV", default_env()),
        };

        let default_provider = match std::env::var("DEFAULT_PROVIDER") {
            Ok(name) if !name.trim().is_empty() => {
                ProviderKind::parse(name.trim()).unwrap_or_else(|| {
                    tracing::warn!(
                        provider = %name,
                        "Unknown DEFAULT_PROVIDER, falling back to gemini"
                    );
                    ProviderKind::Gemini
                })
            }
            _ => ProviderKind::Gemini,
        };

        let providers = ProvidersConfig {
            openai_api_key: env_string("OPENAI_API_KEY", String::new()),
            gemini_api_key: env_string("GEMINI_API_KEY", String::new()),
            openai_api_url: env_string("OPENAI_API_URL", OPENAI_API_URL.to_string()),
            gemini_api_url: env_string("GEMINI_API_URL", GEMINI_API_URL.to_string()),
            default_provider,
        };

        Ok(Self {
            server,
            providers,
            allowed_ips: env_string("APP_IPS", default_allowed_ips()),
            max_body_bytes: env_parse("MAX_BODY_BYTES", default_max_body_bytes())?,
            shutdown_grace_secs: env_parse("SHUTDOWN_GRACE_SECS", default_shutdown_grace_secs())?,
        })
    }
}

fn env_string(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid value for {}: {:?}", key, value)),
        Err(_) => Ok(default),
    }
}
