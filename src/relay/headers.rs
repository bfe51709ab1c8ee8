//! Header construction for the upstream request and the relayed response.
//!
//! [`build_upstream_headers`] produces the fixed header set sent to the
//! forwarding endpoint. [`relay_response_headers`] filters the upstream
//! response headers down to the ones safe to hand back to the caller.

use std::sync::LazyLock;

use axum::http::header::{ACCEPT, CONTENT_LENGTH, CONTENT_TYPE, HOST, SET_COOKIE, USER_AGENT};
use axum::http::{HeaderMap, HeaderName, HeaderValue};

pub const CORRELATION_HEADER: &str = "x-correlation-id";

static HOP_BY_HOP: LazyLock<Vec<HeaderName>> = LazyLock::new(|| {
    [
        "connection",
        "keep-alive",
        "transfer-encoding",
        "te",
        "trailer",
        "upgrade",
        "proxy-authorization",
        "proxy-authenticate",
    ]
    .iter()
    .filter_map(|name| name.parse::<HeaderName>().ok())
    .collect()
});

static USER_AGENT_VALUE: LazyLock<HeaderValue> = LazyLock::new(|| {
    HeaderValue::from_str(concat!("tagrelay/", env!("CARGO_PKG_VERSION")))
        .unwrap_or_else(|_| HeaderValue::from_static("tagrelay"))
});

/// Headers for the forwarded POST: JSON in, JSON preferred out.
pub fn build_upstream_headers(target_url: &url::Url, correlation_id: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, USER_AGENT_VALUE.clone());

    if let Some(host) = target_url.host_str() {
        let host_value = target_url
            .port()
            .map_or_else(|| host.to_string(), |port| format!("{host}:{port}"));
        if let Ok(val) = HeaderValue::from_str(&host_value) {
            headers.insert(HOST, val);
        }
    }

    if let Ok(val) = HeaderValue::from_str(correlation_id) {
        headers.insert(CORRELATION_HEADER, val);
    }

    headers
}

/// Strip headers from an upstream response that must not reach the caller.
///
/// The body has already been fully collected, so `transfer-encoding` and
/// `content-length` are recomputed by axum. Cookies and CORS headers belong
/// to this service, not the upstream.
pub fn relay_response_headers(mut headers: HeaderMap) -> HeaderMap {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
    headers.remove(CONTENT_LENGTH);
    headers.remove(SET_COOKIE);

    let cors: Vec<HeaderName> = headers
        .keys()
        .filter(|name| name.as_str().starts_with("access-control-"))
        .cloned()
        .collect();
    for name in cors {
        headers.remove(name);
    }

    headers
}
