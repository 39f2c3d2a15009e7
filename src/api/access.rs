//! Access guard for the generation endpoint.
//!
//! A request passes when it carries an API key (header or query parameter)
//! or when its client IP is on the configured allowlist. Everything else is
//! answered with a negotiated 403.

use crate::api::handlers::AppState;
use crate::api::negotiate::Responder;
use crate::core::error::AppError;
use crate::core::metrics::record_access_denied;
use axum::{
    extract::{ConnectInfo, Query, Request, State},
    http::{HeaderMap, Uri},
    middleware::Next,
    response::Response,
};
use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

/// Header carrying a caller API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Query parameter carrying a caller API key.
pub const API_KEY_QUERY_PARAM: &str = "apiKey";

/// Client IP reported when no source yields a valid address.
pub const UNKNOWN_IP: &str = "unknown";

/// Headers consulted, in order, after `Forwarded`.
const FORWARDING_HEADERS: &[&str] = &["x-forwarded-for", "x-real-ip"];

/// The set of client IPs allowed through without an API key.
#[derive(Debug, Clone, Default)]
pub struct AccessGuard {
    allowed: HashSet<String>,
}

impl AccessGuard {
    /// Build the allowlist from a comma-separated string.
    ///
    /// Entries are trimmed and empty entries are dropped, so `" ::1, "`
    /// allows exactly `::1`.
    pub fn from_list(list: &str) -> Self {
        let allowed = list
            .split(',')
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(str::to_string)
            .collect();
        Self { allowed }
    }

    pub fn is_allowed(&self, ip: &str) -> bool {
        self.allowed.contains(ip)
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

/// The caller's API key: the `X-API-Key` header, else the first non-empty
/// `apiKey` query parameter. Empty values count as absent.
pub fn extract_api_key(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    let from_header = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|k| !k.is_empty());
    if let Some(key) = from_header {
        return Some(key.to_string());
    }

    // Pairs rather than a struct: a repeated `apiKey` must not fail decoding.
    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri).ok()?;
    pairs
        .into_iter()
        .find(|(name, value)| name == API_KEY_QUERY_PARAM && !value.is_empty())
        .map(|(_, value)| value)
}

/// Validate an address taken from a header or socket, dropping any port.
///
/// Accepts `[v6]`, `[v6]:port`, bare v6, `v4` and `v4:port`. Returns the
/// address text as written (without brackets or port), or `None` when it is
/// not an IP literal.
pub fn parse_ip(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }

    if let (Some(start), Some(end)) = (raw.find('['), raw.find(']')) {
        if end > start {
            let inner = &raw[start + 1..end];
            if inner.parse::<IpAddr>().is_ok() {
                return Some(inner.to_string());
            }
        }
    }

    if raw.contains(':') && raw.parse::<IpAddr>().is_ok() {
        return Some(raw.to_string());
    }

    let host = match raw.rfind(':') {
        Some(idx) => &raw[..idx],
        None => raw,
    };
    host.parse::<IpAddr>().ok().map(|_| host.to_string())
}

/// Extract the `for=` node of an RFC 7239 `Forwarded` header.
///
/// Only the first forwarded element is considered.
pub fn forwarded_for(value: &str) -> Option<String> {
    // ASCII lowercasing keeps byte offsets stable.
    let idx = value.to_ascii_lowercase().find("for=")?;
    let node = value[idx + 4..]
        .split(|c: char| c == ';' || c == ',')
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches('"');
    parse_ip(node)
}

/// Resolve the client IP from proxy headers, then the socket address.
pub fn client_ip(headers: &HeaderMap, remote: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("forwarded")
        .and_then(|v| v.to_str().ok())
        .and_then(forwarded_for);
    if let Some(ip) = forwarded {
        return ip;
    }

    for name in FORWARDING_HEADERS {
        let Some(value) = headers.get(*name).and_then(|v| v.to_str().ok()) else {
            continue;
        };
        if let Some(ip) = value.split(',').find_map(|entry| parse_ip(entry.trim())) {
            return ip;
        }
    }

    // A dual-stack listener reports IPv4 peers as `::ffff:a.b.c.d`.
    remote
        .map(|addr| addr.ip().to_canonical().to_string())
        .unwrap_or_else(|| UNKNOWN_IP.to_string())
}

/// Middleware gating `POST /`.
pub async fn access_guard(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    if extract_api_key(request.headers(), request.uri()).is_some() {
        return next.run(request).await;
    }

    let remote = connect_info.map(|ConnectInfo(addr)| addr);
    let ip = client_ip(request.headers(), remote);

    if state.access_guard.is_allowed(&ip) {
        return next.run(request).await;
    }

    tracing::info!(ip = %ip, "Unauthorized access attempt");
    record_access_denied();

    Responder::new(request.headers(), request.method(), request.uri()).error(AppError::Forbidden)
}
