//! Inbound payload validation and identity enrichment.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{Map, Value};

use crate::identity::IdentityToken;

pub type Payload = Map<String, Value>;

/// An inbound payload the relay refuses to forward. Always a 400.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("No data received")]
    Empty,

    #[error("Malformed JSON body: {0}")]
    Malformed(String),

    #[error("Payload must be a JSON object")]
    NotAnObject,
}

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

/// Parse a request body into a non-empty JSON object.
///
/// An absent or whitespace-only body, `null`, and `{}` all count as empty.
pub fn parse(body: &[u8]) -> Result<Payload, ValidationError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ValidationError::Empty);
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) if map.is_empty() => Err(ValidationError::Empty),
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Err(ValidationError::Empty),
        Ok(_) => Err(ValidationError::NotAnObject),
        Err(e) => Err(ValidationError::Malformed(e.to_string())),
    }
}

/// Insert the identity under `field`. A caller-supplied value for the same
/// key is overwritten, so the result holds exactly one identity field.
#[must_use]
pub fn enrich(mut payload: Payload, field: &str, token: &IdentityToken) -> Payload {
    payload.insert(field.to_string(), Value::String(token.to_string()));
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_non_empty_object() {
        let payload = parse(br#"{"event":"lead_submitted"}"#).unwrap();
        assert_eq!(payload["event"], "lead_submitted");
    }

    #[test]
    fn empty_inputs_rejected() {
        assert_eq!(parse(b""), Err(ValidationError::Empty));
        assert_eq!(parse(b"  \n"), Err(ValidationError::Empty));
        assert_eq!(parse(b"{}"), Err(ValidationError::Empty));
        assert_eq!(parse(b"null"), Err(ValidationError::Empty));
    }

    #[test]
    fn non_objects_rejected() {
        assert_eq!(parse(b"[1,2]"), Err(ValidationError::NotAnObject));
        assert_eq!(parse(b"\"lead\""), Err(ValidationError::NotAnObject));
        assert_eq!(parse(b"42"), Err(ValidationError::NotAnObject));
    }

    #[test]
    fn malformed_json_rejected() {
        assert!(matches!(parse(b"{event:"), Err(ValidationError::Malformed(_))));
    }

    #[test]
    fn enrich_adds_identity_field() {
        let payload = parse(br#"{"event":"lead_submitted"}"#).unwrap();
        let enriched = enrich(payload, "userID", &IdentityToken::from("abc-123"));
        assert_eq!(
            Value::Object(enriched),
            serde_json::json!({ "event": "lead_submitted", "userID": "abc-123" })
        );
    }

    #[test]
    fn identity_field_overwrites_caller_value() {
        let payload = parse(br#"{"userID":"spoofed","n":1}"#).unwrap();
        let enriched = enrich(payload, "userID", &IdentityToken::from("abc-123"));
        assert_eq!(enriched.len(), 2);
        assert_eq!(enriched["userID"], "abc-123");
    }

    #[test]
    fn empty_error_body_matches_contract() {
        assert_eq!(ValidationError::Empty.to_string(), "No data received");
        let response = ValidationError::Empty.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
