//! API layer for the commit server.
//!
//! This module contains the HTTP handlers, the access guard, content
//! negotiation, request/response models, and the router that wires them.

pub mod access;
pub mod handlers;
pub mod models;
pub mod negotiate;
pub mod routes;

// Re-export commonly used types
pub use access::{access_guard, client_ip, parse_ip, AccessGuard};
pub use handlers::{generate_commit, healthz, home, metrics_handler, ApiDoc, AppState};
pub use models::{GenerateRequest, MessageBody};
pub use negotiate::{Responder, ResponseFormat};
pub use routes::app_router;
