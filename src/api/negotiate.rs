//! Content negotiation for every message-shaped response.
//!
//! Clients asking for JSON (or any curl) get `{"message": "..."}`; everyone
//! else gets a small HTML page with the message as its body text.

use crate::api::models::MessageBody;
use crate::core::error::{AppError, SERVER_ERROR_MESSAGE};
use crate::core::error_reporter::report_server_error;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use std::convert::Infallible;

const JSON_CONTENT_TYPE: &str = "application/json";
const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
const PAGE_TITLE: &str = "commit";

/// Encoding chosen for a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Html,
}

impl ResponseFormat {
    /// JSON when `Accept` mentions `application/json` or the caller is curl.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let accept = header_str(headers, header::ACCEPT);
        let user_agent = header_str(headers, header::USER_AGENT);

        if accept.contains(JSON_CONTENT_TYPE) || user_agent.contains("curl") {
            Self::Json
        } else {
            Self::Html
        }
    }
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> &str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// Renders responses for one request.
///
/// Holds the negotiated format plus the method and URI needed when a server
/// fault has to be reported.
#[derive(Debug, Clone)]
pub struct Responder {
    format: ResponseFormat,
    method: Method,
    uri: Uri,
}

impl Responder {
    pub fn new(headers: &HeaderMap, method: &Method, uri: &Uri) -> Self {
        Self {
            format: ResponseFormat::from_headers(headers),
            method: method.clone(),
            uri: uri.clone(),
        }
    }

    pub fn format(&self) -> ResponseFormat {
        self.format
    }

    /// Render `message` with `status` in the negotiated format.
    pub fn render(&self, status: StatusCode, message: &str) -> Response {
        match self.format {
            ResponseFormat::Json => match json_body(message) {
                Ok(body) => json_response(status, body),
                Err(e) => self.serialization_failure(e),
            },
            ResponseFormat::Html => (
                status,
                [(header::CONTENT_TYPE, HTML_CONTENT_TYPE)],
                render_html(message),
            )
                .into_response(),
        }
    }

    /// A successful generation: always `200` JSON, whatever was negotiated.
    pub fn success(&self, message: &str) -> Response {
        match json_body(message) {
            Ok(body) => json_response(StatusCode::OK, body),
            Err(e) => self.serialization_failure(e),
        }
    }

    /// Render an error, reporting it first when it is a server fault.
    pub fn error(&self, err: AppError) -> Response {
        if err.is_server_fault() {
            report_server_error(&self.method, &self.uri, &err);
        }
        self.render(err.status(), &err.public_message())
    }

    // Cannot go back through `render`: JSON encoding is what just failed.
    fn serialization_failure(&self, err: serde_json::Error) -> Response {
        let err = AppError::from(err);
        report_server_error(&self.method, &self.uri, &err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, HTML_CONTENT_TYPE)],
            render_html(SERVER_ERROR_MESSAGE),
        )
            .into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Responder
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::new(&parts.headers, &parts.method, &parts.uri))
    }
}

fn json_body(message: &str) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&MessageBody {
        message: message.to_string(),
    })
}

fn json_response(status: StatusCode, body: Vec<u8>) -> Response {
    (status, [(header::CONTENT_TYPE, JSON_CONTENT_TYPE)], body).into_response()
}

/// Escape the characters that are significant in HTML text and attributes.
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// A minimal standalone page with `message` as its only content.
pub fn render_html(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <meta name="robots" content="noindex, nofollow">
    <title>{title}</title>
    <style>
        * {{ margin: 0; font-family: Verdana, Geneva, Tahoma, sans-serif; }}
        body {{ line-height: 1.5; padding: 10px; background-color: #ffffff; color: #000000; }}
        p {{ overflow-wrap: break-word; }}
        @media (prefers-color-scheme: dark) {{
            body {{ background-color: #121212; color: #ffffff; }}
        }}
    </style>
</head>
<body>
    <p>{message}</p>
</body>
</html>
"#,
        title = PAGE_TITLE,
        message = escape_html(message),
    )
}
