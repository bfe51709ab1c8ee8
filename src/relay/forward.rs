//! Single-shot POST to the forwarding endpoint and its caller-facing mapping.
//!
//! [`forward`] never retries: one attempt either yields an upstream
//! response or a transport failure. The outcome is captured in
//! [`ForwardResult`], whose [`IntoResponse`] impl is the only place the
//! upstream outcome is translated into what the original caller sees.

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};

use super::headers::{build_upstream_headers, relay_response_headers};
use super::payload::Payload;
use crate::server::HttpClient;

pub const FORWARD_ERROR_MESSAGE: &str = "Error occurred while forwarding data.";

#[derive(Debug)]
pub enum ForwardResult {
    /// Upstream answered with a 2xx status.
    Success {
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
    },
    /// Upstream answered, but with a non-success status.
    UpstreamError { status: StatusCode, body: Bytes },
    /// No usable response was received.
    TransportError(String),
}

impl ForwardResult {
    /// Local description of the failure, `None` on success.
    #[must_use]
    pub fn error_description(&self) -> Option<String> {
        match self {
            Self::Success { .. } => None,
            Self::UpstreamError { status, .. } => {
                Some(format!("Request failed with status code {}", status.as_u16()))
            }
            Self::TransportError(cause) => Some(cause.clone()),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

fn error_body(description: String) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": FORWARD_ERROR_MESSAGE,
        "error": description,
    }))
}

impl IntoResponse for ForwardResult {
    fn into_response(self) -> Response {
        let description = self.error_description();
        match self {
            Self::Success {
                status,
                headers,
                body,
            } => {
                let mut response = Response::new(Body::from(body));
                *response.status_mut() = status;
                *response.headers_mut() = relay_response_headers(headers);
                response
            }
            Self::UpstreamError { status, .. } => {
                (status, error_body(description.unwrap_or_default())).into_response()
            }
            Self::TransportError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_body(description.unwrap_or_default()),
            )
                .into_response(),
        }
    }
}

pub struct ForwardRequest<'a> {
    pub client: &'a HttpClient,
    pub url: &'a url::Url,
    pub payload: &'a Payload,
    pub timeout: Option<Duration>,
    pub correlation_id: &'a str,
}

#[allow(clippy::cast_possible_truncation)]
pub async fn forward(req: ForwardRequest<'_>) -> ForwardResult {
    let start = Instant::now();

    let body = match serde_json::to_vec(req.payload) {
        Ok(b) => Bytes::from(b),
        Err(e) => return ForwardResult::TransportError(format!("failed to encode payload: {e}")),
    };

    let mut builder = hyper::Request::builder()
        .method(Method::POST)
        .uri(req.url.as_str());
    for (key, value) in &build_upstream_headers(req.url, req.correlation_id) {
        builder = builder.header(key, value);
    }
    let request = match builder.body(Full::new(body)) {
        Ok(r) => r,
        Err(e) => return ForwardResult::TransportError(e.to_string()),
    };

    let exchange = async {
        let response = req
            .client
            .request(request)
            .await
            .map_err(|e| describe_client_error(&e))?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| format!("body read error: {e}"))?
            .to_bytes();
        Ok::<_, String>((status, headers, body))
    };

    let outcome = match req.timeout {
        Some(limit) => tokio::time::timeout(limit, exchange)
            .await
            .unwrap_or_else(|_| Err(format!("timeout of {}ms exceeded", limit.as_millis()))),
        None => exchange.await,
    };
    let latency_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok((status, headers, body)) if status.is_success() => {
            tracing::info!(
                correlation_id = %req.correlation_id,
                status = status.as_u16(),
                latency_ms,
                "upstream responded"
            );
            tracing::debug!(
                correlation_id = %req.correlation_id,
                body = %String::from_utf8_lossy(&body),
                "upstream response body"
            );
            ForwardResult::Success {
                status,
                headers,
                body,
            }
        }
        Ok((status, _, body)) => {
            tracing::warn!(
                correlation_id = %req.correlation_id,
                status = status.as_u16(),
                latency_ms,
                body = %String::from_utf8_lossy(&body),
                "upstream rejected payload"
            );
            ForwardResult::UpstreamError { status, body }
        }
        Err(cause) => {
            tracing::error!(
                correlation_id = %req.correlation_id,
                error = %cause,
                latency_ms,
                "error forwarding payload"
            );
            ForwardResult::TransportError(cause)
        }
    }
}

/// Flatten a client error and its sources into one line. The top-level
/// hyper-util message alone ("client error (Connect)") hides the cause.
fn describe_client_error(err: &dyn std::error::Error) -> String {
    let mut description = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        description.push_str(": ");
        description.push_str(&cause.to_string());
        source = cause.source();
    }
    description
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn success_is_passed_through_verbatim() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "application/json".parse().unwrap());
        headers.insert("content-length", "11".parse().unwrap());
        let result = ForwardResult::Success {
            status: StatusCode::CREATED,
            headers,
            body: Bytes::from_static(br#"{"ok":true}"#),
        };

        let response = result.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["content-type"], "application/json");
        assert!(response.headers().get("content-length").is_none());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], br#"{"ok":true}"#);
    }

    #[tokio::test]
    async fn upstream_error_keeps_status_and_wraps_body() {
        let result = ForwardResult::UpstreamError {
            status: StatusCode::NOT_FOUND,
            body: Bytes::from_static(b"no such hook"),
        };

        let response = result.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({
                "message": "Error occurred while forwarding data.",
                "error": "Request failed with status code 404",
            })
        );
    }

    #[tokio::test]
    async fn transport_error_becomes_500() {
        let result = ForwardResult::TransportError("connection refused".into());

        let response = result.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            serde_json::json!({
                "message": "Error occurred while forwarding data.",
                "error": "connection refused",
            })
        );
    }

    #[test]
    fn only_success_has_no_description() {
        let ok = ForwardResult::Success {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        };
        assert!(ok.is_success());
        assert_eq!(ok.error_description(), None);
        assert!(!ForwardResult::TransportError("x".into()).is_success());
    }

    #[derive(Debug)]
    struct Wrapped(std::io::Error);

    impl std::fmt::Display for Wrapped {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("client error (Connect)")
        }
    }

    impl std::error::Error for Wrapped {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn client_error_description_includes_sources() {
        let err = Wrapped(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        assert_eq!(
            describe_client_error(&err),
            "client error (Connect): connection refused"
        );
    }
}
