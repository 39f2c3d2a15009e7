//! Core functionality for the commit server.
//!
//! This module contains fundamental components used throughout the application:
//! - Configuration management
//! - Error handling and server-fault reporting
//! - Logging context
//! - Metrics collection
//! - HTTP middleware

pub mod config;
pub mod error;
pub mod error_reporter;
pub mod logging;
pub mod metrics;
pub mod middleware;

// Re-export commonly used types
pub use config::{AppConfig, ProvidersConfig, ServerConfig};
pub use error::{AppError, Result};
pub use error_reporter::report_server_error;
pub use logging::{get_provider_context, get_request_id, PROVIDER_CONTEXT, REQUEST_ID};
pub use metrics::{get_metrics, init_metrics, Metrics};
pub use middleware::MetricsMiddleware;
