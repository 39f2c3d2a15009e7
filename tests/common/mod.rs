//! Shared helpers for the router-level integration tests.

#![allow(dead_code)]

use axum::{
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{Request, Response},
    Router,
};
use commit_server::{
    api::{app_router, AppState},
    core::{config::ProvidersConfig, init_metrics, AppConfig},
    providers::ProviderKind,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const OPENAI_PATH: &str = "/openai/v1/chat/completions";
pub const GEMINI_PATH: &str = "/gemini/v1beta/openai/chat/completions";

/// Address every test request appears to come from.
pub fn peer_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 40000))
}

/// Config whose providers live under `base_url`.
pub fn test_config(base_url: &str, allowed_ips: &str) -> AppConfig {
    AppConfig {
        providers: ProvidersConfig {
            openai_api_key: "sk-server-openai".to_string(),
            gemini_api_key: "gm-server".to_string(),
            openai_api_url: format!("{}{}", base_url, OPENAI_PATH),
            gemini_api_url: format!("{}{}", base_url, GEMINI_PATH),
            default_provider: ProviderKind::Gemini,
        },
        allowed_ips: allowed_ips.to_string(),
        ..AppConfig::default()
    }
}

/// Build the router with every request appearing to come from `peer`.
pub fn build_app(config: AppConfig, peer: SocketAddr) -> Router {
    init_metrics();

    let state = Arc::new(AppState::new(config, reqwest::Client::new()));
    app_router(state).layer(MockConnectInfo(peer))
}

/// Create a test app whose providers point at `mock_server`.
pub fn create_test_app(mock_server: &MockServer, allowed_ips: &str) -> Router {
    build_app(test_config(&mock_server.uri(), allowed_ips), peer_addr())
}

/// A chat completion whose first choice carries `content`.
pub fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    }))
}

/// Mount a provider mock at `route` that must be hit exactly `times` times.
pub async fn mount_provider(
    mock_server: &MockServer,
    route: &str,
    response: ResponseTemplate,
    times: u64,
) {
    Mock::given(method("POST"))
        .and(path(route))
        .respond_with(response)
        .expect(times)
        .mount(mock_server)
        .await;
}

/// A JSON `POST /` request.
pub fn generate_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .header("accept", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}
