//! Server-fault reporting.
//!
//! Only 5xx paths come through here; client faults are answered directly.

use crate::core::logging::get_request_id;
use axum::http::{Method, Uri};
use std::backtrace::Backtrace;
use std::error::Error;

/// Log a server fault together with the request that triggered it.
///
/// The record carries the error text and its source chain, the request
/// method and URL, the request id, and a captured backtrace. This function
/// only writes a log line and never panics.
pub fn report_server_error(method: &Method, uri: &Uri, err: &(dyn Error + 'static)) {
    let trace = Backtrace::force_capture();

    tracing::error!(
        group = "request",
        request_id = %get_request_id(),
        request.method = %method,
        request.url = %redacted_url(uri),
        error = %err,
        causes = %error_chain(err),
        trace = %trace,
        "Server error"
    );
}

// The apiKey query parameter is a credential.
fn redacted_url(uri: &Uri) -> String {
    let Some(query) = uri.query() else {
        return uri.to_string();
    };

    let query = query
        .split('&')
        .map(|pair| {
            if pair.starts_with("apiKey=") {
                "apiKey=***"
            } else {
                pair
            }
        })
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", uri.path(), query)
}

fn error_chain(err: &(dyn Error + 'static)) -> String {
    let mut causes = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        causes.push(cause.to_string());
        source = cause.source();
    }
    causes.join(": ")
}
