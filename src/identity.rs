//! Anonymous per-browser identity carried in a long-lived cookie.
//!
//! The server keeps no identity store: each request either presents a
//! token in its `Cookie` header or gets a freshly minted UUID v4 plus a
//! `Set-Cookie` directive. [`resolve`] is the pure read-or-mint step and
//! [`assign_identity`] is the axum middleware that applies it to every
//! route.

use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::config::model::IdentityConfig;
use crate::server::AppState;

/// One year, in seconds. `Set-Cookie` expresses `Max-Age` in seconds.
pub const COOKIE_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 365;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityToken(String);

impl IdentityToken {
    #[must_use]
    pub fn mint() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for IdentityToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityPolicy {
    pub cookie_name: String,
    pub field: String,
    pub fallback: String,
}

impl Default for IdentityPolicy {
    fn default() -> Self {
        Self::from(&IdentityConfig::default())
    }
}

impl From<&IdentityConfig> for IdentityPolicy {
    fn from(config: &IdentityConfig) -> Self {
        Self {
            cookie_name: config.cookie_name.clone(),
            field: config.field.clone(),
            fallback: config.fallback.clone(),
        }
    }
}

/// Identity resolved for the current request, stored as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub token: IdentityToken,
    /// `true` when the token was minted for this request.
    pub minted: bool,
}

/// Find the first non-empty value of cookie `name` across all `Cookie` headers.
#[must_use]
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| {
            let (k, v) = pair.trim().split_once('=')?;
            (k.trim() == name).then(|| {
                let v = v.trim();
                v.strip_prefix('"')
                    .and_then(|s| s.strip_suffix('"'))
                    .unwrap_or(v)
            })
        })
        .find(|v| !v.is_empty())
}

/// Read the identity cookie or mint a new token.
#[must_use]
pub fn resolve(headers: &HeaderMap, policy: &IdentityPolicy) -> Identity {
    match cookie_value(headers, &policy.cookie_name) {
        Some(existing) => Identity {
            token: IdentityToken::from(existing),
            minted: false,
        },
        None => Identity {
            token: IdentityToken::mint(),
            minted: true,
        },
    }
}

/// Build the `Set-Cookie` value persisting `token` for one year from now.
///
/// Returns `None` only if the token contains bytes not allowed in a header,
/// which cannot happen for minted UUIDs.
#[must_use]
pub fn set_cookie_header(policy: &IdentityPolicy, token: &IdentityToken) -> Option<HeaderValue> {
    set_cookie_header_at(policy, token, OffsetDateTime::now_utc())
}

/// Like [`set_cookie_header`], with `Expires` computed from `now`.
#[must_use]
pub fn set_cookie_header_at(
    policy: &IdentityPolicy,
    token: &IdentityToken,
    now: OffsetDateTime,
) -> Option<HeaderValue> {
    // IMF-fixdate; agents that ignore Max-Age fall back to Expires.
    let http_date = format_description!(
        "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
    );
    let expires = (now.to_offset(time::UtcOffset::UTC)
        + std::time::Duration::from_secs(COOKIE_MAX_AGE_SECS))
    .format(http_date)
    .ok()?;
    HeaderValue::from_str(&format!(
        "{}={}; Max-Age={COOKIE_MAX_AGE_SECS}; Expires={expires}; Path=/; HttpOnly; Secure; \
         SameSite=Lax",
        policy.cookie_name, token
    ))
    .ok()
}

pub async fn assign_identity(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let policy = &state.settings.identity;
    let identity = resolve(req.headers(), policy);

    if identity.minted {
        state.stats.identities_minted.fetch_add(1, Ordering::Relaxed);
        tracing::info!(user_id = %identity.token, "new user assigned ID");
    } else {
        tracing::debug!(user_id = %identity.token, "returning user");
    }

    req.extensions_mut().insert(identity.clone());
    let mut response = next.run(req).await;

    if identity.minted {
        match set_cookie_header(policy, &identity.token) {
            Some(cookie) => {
                response.headers_mut().append(SET_COOKIE, cookie);
            }
            None => {
                tracing::warn!(
                    user_id = %identity.token,
                    "identity token is not a valid header value"
                );
            }
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn headers_with_cookie(raw: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(raw).unwrap());
        headers
    }

    #[test]
    fn finds_cookie_among_others() {
        let headers = headers_with_cookie("_ga=GA1.2.3; userID=abc-123; theme=dark");
        assert_eq!(cookie_value(&headers, "userID"), Some("abc-123"));
        assert_eq!(cookie_value(&headers, "theme"), Some("dark"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn cookie_lookup_spans_multiple_headers() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("a=1"));
        headers.append(COOKIE, HeaderValue::from_static("userID=xyz"));
        assert_eq!(cookie_value(&headers, "userID"), Some("xyz"));
    }

    #[test]
    fn cookie_name_match_is_exact() {
        let headers = headers_with_cookie("xuserID=nope; userIDx=nope");
        assert_eq!(cookie_value(&headers, "userID"), None);
    }

    #[test]
    fn quoted_cookie_value_is_unwrapped() {
        let headers = headers_with_cookie("userID=\"abc\"");
        assert_eq!(cookie_value(&headers, "userID"), Some("abc"));
    }

    #[test]
    fn empty_cookie_counts_as_absent() {
        let headers = headers_with_cookie("userID=");
        let identity = resolve(&headers, &IdentityPolicy::default());
        assert!(identity.minted);
    }

    #[test]
    fn existing_cookie_is_reused() {
        let headers = headers_with_cookie("userID=abc-123");
        let identity = resolve(&headers, &IdentityPolicy::default());
        assert!(!identity.minted);
        assert_eq!(identity.token.as_str(), "abc-123");
    }

    #[test]
    fn resolve_is_stable_for_same_cookie() {
        let headers = headers_with_cookie("userID=abc-123");
        let policy = IdentityPolicy::default();
        assert_eq!(resolve(&headers, &policy), resolve(&headers, &policy));
    }

    #[test]
    fn missing_cookie_mints_uuid() {
        let identity = resolve(&HeaderMap::new(), &IdentityPolicy::default());
        assert!(identity.minted);
        assert!(uuid::Uuid::parse_str(identity.token.as_str()).is_ok());
    }

    #[test]
    fn minted_tokens_do_not_collide() {
        let tokens: HashSet<_> = (0..10_000).map(|_| IdentityToken::mint()).collect();
        assert_eq!(tokens.len(), 10_000);
    }

    #[test]
    fn set_cookie_carries_fixed_policy() {
        let token = IdentityToken::from("abc-123");
        let now = time::macros::datetime!(2026-01-01 0:00 UTC);
        let value = set_cookie_header_at(&IdentityPolicy::default(), &token, now).unwrap();
        assert_eq!(
            value.to_str().unwrap(),
            "userID=abc-123; Max-Age=31536000; Expires=Fri, 01 Jan 2027 00:00:00 GMT; Path=/; \
             HttpOnly; Secure; SameSite=Lax"
        );
    }

    #[test]
    fn expires_is_normalized_to_gmt() {
        let token = IdentityToken::from("abc-123");
        let now = time::macros::datetime!(2026-03-01 01:30 +02:00);
        let value = set_cookie_header_at(&IdentityPolicy::default(), &token, now).unwrap();
        assert!(value
            .to_str()
            .unwrap()
            .contains("Expires=Sun, 28 Feb 2027 23:30:00 GMT;"));
    }

    #[test]
    fn custom_cookie_name_is_honored() {
        let policy = IdentityPolicy {
            cookie_name: "rid".into(),
            ..IdentityPolicy::default()
        };
        let headers = headers_with_cookie("userID=ignored; rid=r-1");
        assert_eq!(resolve(&headers, &policy).token.as_str(), "r-1");
    }
}
