//! Payload forwarding handler.
//!
//! The [`forward_handler`] function receives tag-manager payloads on the
//! configured forward path, validates them ([`payload`]), stamps them
//! with the caller's identity, and relays them to the forwarding
//! endpoint ([`forward`]). Header handling lives in [`headers`].

pub mod forward;
pub mod headers;
pub mod payload;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::header::ORIGIN;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Extension;

use crate::identity::{Identity, IdentityToken};
use crate::server::AppState;
use forward::{ForwardRequest, ForwardResult};
use headers::CORRELATION_HEADER;

/// Refuse cross-origin submissions from origins outside the allow-list.
///
/// Requests without an `Origin` header (server-to-server, curl) pass.
pub async fn reject_foreign_origin(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    if let Some(origin) = req.headers().get(ORIGIN) {
        if !state.settings.allowed_origins.contains(origin) {
            tracing::warn!(origin = ?origin, "origin not allowed by CORS");
            state.stats.rejected.fetch_add(1, Ordering::Relaxed);
            return StatusCode::FORBIDDEN.into_response();
        }
    }
    next.run(req).await
}

pub async fn forward_handler(
    State(state): State<Arc<AppState>>,
    identity: Option<Extension<Identity>>,
    req_headers: HeaderMap,
    body: Bytes,
) -> Response {
    let correlation_id = req_headers
        .get(CORRELATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), String::from);

    let settings = &state.settings;

    tracing::info!(
        correlation_id = %correlation_id,
        bytes = body.len(),
        "payload received"
    );
    tracing::debug!(
        correlation_id = %correlation_id,
        payload = %String::from_utf8_lossy(&body),
        cookies = ?req_headers.get_all(axum::http::header::COOKIE).iter().collect::<Vec<_>>(),
        "inbound request"
    );

    let inbound = match payload::parse(&body) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(correlation_id = %correlation_id, error = %e, "payload rejected");
            state.stats.rejected.fetch_add(1, Ordering::Relaxed);
            return with_correlation_id(e.into_response(), &correlation_id);
        }
    };

    let token = identity.map_or_else(
        || IdentityToken::from(settings.identity.fallback.as_str()),
        |Extension(identity)| identity.token,
    );
    let outbound = payload::enrich(inbound, &settings.identity.field, &token);

    tracing::debug!(
        correlation_id = %correlation_id,
        payload = %serde_json::Value::Object(outbound.clone()),
        "forwarding payload"
    );

    let result = forward::forward(ForwardRequest {
        client: &state.http_client,
        url: &settings.forward_url,
        payload: &outbound,
        timeout: settings.timeout,
        correlation_id: &correlation_id,
    })
    .await;

    record(&state, &result);
    with_correlation_id(result.into_response(), &correlation_id)
}

fn record(state: &AppState, result: &ForwardResult) {
    if result.is_success() {
        state.stats.forwarded.fetch_add(1, Ordering::Relaxed);
    } else {
        state.stats.failed.fetch_add(1, Ordering::Relaxed);
    }
}

fn with_correlation_id(mut response: Response, correlation_id: &str) -> Response {
    if let Ok(val) = HeaderValue::from_str(correlation_id) {
        response.headers_mut().insert(CORRELATION_HEADER, val);
    }
    response
}
