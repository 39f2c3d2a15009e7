//! Error types and handling for the commit server.
//!
//! Every failure on the request path becomes an [`AppError`], which knows its
//! HTTP status and the message a client is allowed to see. Rendering happens
//! in [`crate::api::negotiate`], which picks JSON or HTML per request.

use crate::providers::ProviderError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Message shown for every server fault; internals are never leaked.
pub const SERVER_ERROR_MESSAGE: &str =
    "The server encountered a problem and could not process your request";

/// Message shown for unknown routes.
pub const NOT_FOUND_MESSAGE: &str = "The requested resource could not be found";

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum AppError {
    /// Client provided invalid data
    #[error("{0}")]
    BadRequest(String),

    /// Caller is neither allowlisted nor carrying an API key
    #[error("Forbidden")]
    Forbidden,

    /// No route matched
    #[error("{}", NOT_FOUND_MESSAGE)]
    NotFound,

    /// Generation failed upstream; relayed to the caller as a client fault
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// JSON serialization errors while building a response
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal server errors with custom message
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::Provider(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Serialization(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether this error goes through the server-fault reporting path.
    pub fn is_server_fault(&self) -> bool {
        self.status().is_server_error()
    }

    /// The message the client sees.
    pub fn public_message(&self) -> String {
        if self.is_server_fault() {
            SERVER_ERROR_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

/// Plain JSON rendering, for paths without a request to negotiate against.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "message": self.public_message() }))).into_response()
    }
}

/// Convenience type alias for Results using [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
