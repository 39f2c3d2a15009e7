//! HTTP request handlers for the commit server.
//!
//! This module implements the generation endpoint and the small supporting
//! surface (landing message, health, metrics, OpenAPI document).

use crate::api::access::{AccessGuard, API_KEY_HEADER};
use crate::api::models::{GenerateRequest, MessageBody};
use crate::api::negotiate::Responder;
use crate::core::config::AppConfig;
use crate::core::error::{AppError, Result};
use crate::core::logging::get_request_id;
use crate::providers::ProviderKind;
use crate::services::ProviderService;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use prometheus::{proto::MetricFamily, Encoder, TextEncoder};
use std::sync::Arc;
use utoipa::OpenApi;

/// Application state shared across all handlers.
pub struct AppState {
    pub config: AppConfig,
    pub provider_service: ProviderService,
    pub access_guard: AccessGuard,
}

impl AppState {
    /// Build the shared state; both provider clients reuse `http_client`.
    pub fn new(config: AppConfig, http_client: reqwest::Client) -> Self {
        let provider_service = ProviderService::new(&config.providers, http_client);
        let access_guard = AccessGuard::from_list(&config.allowed_ips);
        Self {
            config,
            provider_service,
            access_guard,
        }
    }
}

/// OpenAPI document for the public surface.
#[derive(OpenApi)]
#[openapi(
    paths(generate_commit, home, healthz),
    components(schemas(GenerateRequest, MessageBody)),
    modifiers(&SecurityAddon),
    tags((name = "commit", description = "Commit message generation"))
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new(API_KEY_HEADER),
                    ),
                ),
            );
        }
    }
}

/// Generate a commit message from a diff.
///
/// Callers that are not on the IP allowlist must send an API key.
#[utoipa::path(
    post,
    path = "/",
    tag = "commit",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Generated commit message", body = MessageBody),
        (status = 400, description = "Invalid request or provider failure", body = MessageBody),
        (status = 403, description = "Caller not allowed", body = MessageBody),
        (status = 500, description = "Server fault", body = MessageBody)
    ),
    security((), ("api_key" = []))
)]
#[tracing::instrument(skip_all, fields(request_id = %get_request_id()))]
pub async fn generate_commit(
    State(state): State<Arc<AppState>>,
    responder: Responder,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => return responder.render(rejection.status(), &rejection.body_text()),
    };

    match generate(&state, &body).await {
        Ok(message) => responder.success(&message),
        Err(err) => responder.error(err),
    }
}

async fn generate(state: &AppState, body: &[u8]) -> Result<String> {
    let request: GenerateRequest =
        serde_json::from_slice(body).map_err(|e| AppError::BadRequest(e.to_string()))?;

    if request.diff.trim().is_empty() {
        return Err(AppError::BadRequest("diff must not be empty".to_string()));
    }

    let requested = parse_requested_provider(request.provider.as_deref())?;
    let client = state.provider_service.select(requested);

    tracing::debug!(
        provider = %client.kind(),
        diff_bytes = request.diff.len(),
        "Generating commit message"
    );

    let message = client.generate(&request.diff, request.api_key.as_deref()).await?;
    Ok(message)
}

/// An omitted or empty provider means the default; anything else must be known.
fn parse_requested_provider(provider: Option<&str>) -> Result<Option<ProviderKind>> {
    match provider {
        None | Some("") => Ok(None),
        Some(name) => ProviderKind::parse(name)
            .map(Some)
            .ok_or_else(|| AppError::BadRequest("invalid provider specified".to_string())),
    }
}

/// Tell the visitor how to install the client.
#[utoipa::path(
    get,
    path = "/",
    tag = "commit",
    responses((status = 200, description = "Install instructions", body = MessageBody))
)]
pub async fn home(
    State(state): State<Arc<AppState>>,
    responder: Responder,
    headers: HeaderMap,
) -> Response {
    let domain = request_domain(&headers, state.config.server.is_production());
    let message = format!(
        "Run this command from your terminal: curl -s {} | sh -- -k 'YOUR_OPEN_API_KEY'",
        domain
    );
    responder.render(StatusCode::OK, &message)
}

/// Scheme and host the caller used to reach us.
///
/// Production is always served over https; elsewhere the proxy's
/// `X-Forwarded-Proto` decides, defaulting to http.
pub fn request_domain(headers: &HeaderMap, production: bool) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");

    let proto = if production {
        "https"
    } else {
        headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .filter(|p| !p.is_empty())
            .unwrap_or("http")
    };

    format!("{}://{}", proto, host)
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/healthz",
    tag = "commit",
    responses((status = 200, description = "Server is up", body = String, content_type = "text/plain"))
)]
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain")], "ok")
}

/// Fallback for unknown routes.
pub async fn not_found(responder: Responder) -> Response {
    responder.error(AppError::NotFound)
}

/// Prometheus metrics endpoint.
///
/// Returns metrics in Prometheus text format.
pub async fn metrics_handler(responder: Responder) -> Response {
    encode_metrics(&responder, &prometheus::gather())
}

fn encode_metrics(responder: &Responder, metric_families: &[MetricFamily]) -> Response {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(metric_families, &mut buffer) {
        return responder.error(AppError::Internal(e.to_string()));
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        buffer,
    )
        .into_response()
}

/// The OpenAPI document as JSON.
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Method, Uri};

    #[test]
    fn test_parse_requested_provider() {
        assert_eq!(parse_requested_provider(None).unwrap(), None);
        assert_eq!(parse_requested_provider(Some("")).unwrap(), None);
        assert_eq!(
            parse_requested_provider(Some("openai")).unwrap(),
            Some(ProviderKind::OpenAi)
        );
        assert_eq!(
            parse_requested_provider(Some("gemini")).unwrap(),
            Some(ProviderKind::Gemini)
        );

        let err = parse_requested_provider(Some("ruby")).unwrap_err();
        assert_eq!(err.to_string(), "invalid provider specified");
    }

    #[test]
    fn test_request_domain() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("commit.example.dev"));

        assert_eq!(request_domain(&headers, true), "https://commit.example.dev");
        assert_eq!(request_domain(&headers, false), "http://commit.example.dev");

        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        assert_eq!(request_domain(&headers, false), "https://commit.example.dev");

        assert_eq!(request_domain(&HeaderMap::new(), false), "http://localhost");
    }

    fn metrics_responder() -> Responder {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        Responder::new(&headers, &Method::GET, &Uri::from_static("/metrics"))
    }

    #[tokio::test]
    async fn test_encode_metrics_failure_is_server_error() {
        // The text encoder rejects families without samples.
        let mut family = MetricFamily::default();
        family.set_name("commit_server_empty".to_string());

        let response = encode_metrics(&metrics_responder(), &[family]);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["message"], crate::core::error::SERVER_ERROR_MESSAGE);
    }

    #[test]
    fn test_encode_metrics_text_format() {
        crate::core::metrics::init_metrics();
        let response = encode_metrics(&metrics_responder(), &prometheus::gather());
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_openapi_document() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/"));
        assert!(doc.paths.paths.contains_key("/healthz"));

        let json = serde_json::to_value(&doc).unwrap();
        assert!(json["components"]["schemas"]["GenerateRequest"].is_object());
        assert!(json["components"]["securitySchemes"]["api_key"].is_object());
    }
}
