//! Router construction.

use crate::api::access::access_guard;
use crate::api::handlers::{
    generate_commit, healthz, home, metrics_handler, not_found, openapi_json, AppState,
};
use crate::core::middleware::{
    cors_layer, reject_trailing_slash, request_id_middleware, MetricsMiddleware,
};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the application router with all routes and middleware.
///
/// Layers run outermost first: trace, CORS, request id, metrics, trailing
/// slash rejection. The access guard sits on `POST /` alone.
pub fn app_router(state: Arc<AppState>) -> Router {
    let max_body_bytes = state.config.max_body_bytes;

    let root = get(home).merge(
        post(generate_commit)
            .route_layer(middleware::from_fn_with_state(state.clone(), access_guard)),
    );

    Router::new()
        .route("/", root)
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics_handler))
        .route("/api-docs/openapi.json", get(openapi_json))
        .fallback(not_found)
        .layer(middleware::from_fn(reject_trailing_slash))
        .layer(middleware::from_fn(MetricsMiddleware::track_metrics))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}
