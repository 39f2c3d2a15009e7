//! HTTP middleware for request ids, metrics, path hygiene, and CORS.
//!
//! The access guard lives with the API in [`crate::api::access`] since it
//! needs application state; everything here is stateless.

use crate::api::negotiate::Responder;
use crate::core::error::AppError;
use crate::core::logging::{generate_request_id, REQUEST_ID};
use crate::core::metrics::get_metrics;
use axum::{
    extract::{MatchedPath, Request},
    http::{header, HeaderName, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};

/// Response header carrying the per-request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Assign a request id, scope it for the rest of the pipeline, and echo it
/// back to the client.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = generate_request_id();

    let mut response = REQUEST_ID
        .scope(request_id.clone(), next.run(request))
        .await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Answer any path with a trailing slash (other than the root) with a 404.
pub async fn reject_trailing_slash(request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if path != "/" && path.ends_with('/') {
        let responder = Responder::new(request.headers(), request.method(), request.uri());
        return responder.error(AppError::NotFound);
    }
    next.run(request).await
}

/// CORS policy for the public surface.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-api-key")])
}

/// Middleware for tracking request metrics.
pub struct MetricsMiddleware;

impl MetricsMiddleware {
    /// Track metrics for incoming requests.
    ///
    /// Requests are labelled by their route template rather than the raw
    /// path so unknown URLs cannot blow up label cardinality.
    pub async fn track_metrics(request: Request, next: Next) -> Response {
        let endpoint = request
            .extensions()
            .get::<MatchedPath>()
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| "unmatched".to_string());
        let method = request.method().to_string();

        // Skip metrics endpoint itself to avoid recursion
        if endpoint == "/metrics" {
            return next.run(request).await;
        }

        let metrics = get_metrics();
        let active = metrics.active_requests.with_label_values(&[&endpoint]);
        active.inc();

        let start = Instant::now();
        let response = next.run(request).await;
        let duration = start.elapsed().as_secs_f64();

        active.dec();

        let status_code = response.status().as_u16().to_string();
        metrics
            .request_count
            .with_label_values(&[&method, &endpoint, &status_code])
            .inc();
        metrics
            .request_duration
            .with_label_values(&[&method, &endpoint])
            .observe(duration);

        tracing::debug!(
            method = %method,
            endpoint = %endpoint,
            status = %status_code,
            duration_ms = (duration * 1000.0) as u64,
            "Request completed"
        );

        response
    }
}
