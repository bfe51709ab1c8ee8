//! Configuration validation with detailed error reporting.
//!
//! The [`validate`] function checks a parsed [`Config`] for structural
//! errors such as a missing or malformed forwarding URL, a clashing
//! forward path, an invalid cookie name, and malformed CORS origins.
//! Returns a list of [`ConfigIssue`] values with per-field suggestions.

use std::collections::HashSet;

use url::Url;

use super::model::Config;
use crate::error::ConfigIssue;

/// Paths served by the relay itself that the forward path must not shadow.
pub const RESERVED_PATHS: &[&str] = &["/", "/health"];

/// Validate the forwarding URL. Returns `Ok(())` or a human-readable error.
pub fn validate_forward_url(url: &str) -> Result<(), String> {
    match Url::parse(url) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            if scheme != "http" && scheme != "https" {
                Err(format!(
                    "unsupported scheme '{scheme}' (expected http or https)"
                ))
            } else if parsed.host_str().is_none() {
                Err(format!("'{url}' has no host"))
            } else {
                Ok(())
            }
        }
        Err(_) => Err(format!("'{url}' is not a valid URL")),
    }
}

/// Validate the local forward path. Returns `Ok(())` or a human-readable error.
pub fn validate_forward_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("path cannot be empty".into());
    }
    if !path.starts_with('/') {
        return Err(format!("path must start with '/' (did you mean '/{path}'?)"));
    }
    if RESERVED_PATHS.contains(&path) {
        return Err(format!("'{path}' is reserved for the liveness endpoints"));
    }
    if path.contains(['{', '}', '*']) || path.split('/').any(|seg| seg.starts_with(':')) {
        return Err("path must be literal (no captures or wildcards)".into());
    }
    Ok(())
}

/// Validate a cookie name against the RFC 6265 token grammar.
pub fn validate_cookie_name(name: &str) -> Result<(), String> {
    const SEPARATORS: &[char] = &[
        '(', ')', '<', '>', '@', ',', ';', ':', '\\', '"', '/', '[', ']', '?', '=', '{', '}',
    ];
    if name.is_empty() {
        return Err("cookie name cannot be empty".into());
    }
    if let Some(c) = name
        .chars()
        .find(|c| !c.is_ascii() || c.is_ascii_control() || *c == ' ' || SEPARATORS.contains(c))
    {
        return Err(format!("cookie name contains invalid character '{c}'"));
    }
    Ok(())
}

/// Validate a CORS origin. Origins are matched byte-for-byte, so they must be
/// in the serialized `scheme://host[:port]` form browsers send.
pub fn validate_origin(origin: &str) -> Result<(), String> {
    let parsed = Url::parse(origin).map_err(|_| format!("'{origin}' is not a valid origin"))?;
    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(format!(
            "unsupported scheme '{scheme}' (expected http or https)"
        ));
    }
    if parsed.host_str().is_none() {
        return Err(format!("'{origin}' has no host"));
    }
    let serialized = parsed.origin().ascii_serialization();
    if serialized != origin {
        return Err(format!("'{origin}' is not a bare origin"));
    }
    Ok(())
}

pub fn validate(config: &Config) -> Result<(), Vec<ConfigIssue>> {
    let mut issues = Vec::new();

    match config.forward.url.as_deref() {
        Some(url) => {
            if let Err(msg) = validate_forward_url(url) {
                issues.push(ConfigIssue::new("forward", "url", msg));
            }
        }
        None => {
            issues.push(
                ConfigIssue::new("forward", "url", "a forwarding URL is required")
                    .with_suggestion("set forward.url or pass --forward-url"),
            );
        }
    }

    if let Err(msg) = validate_forward_path(&config.forward.path) {
        let path = &config.forward.path;
        let issue = ConfigIssue::new("forward", "path", msg);
        issues.push(if !path.is_empty() && !path.starts_with('/') {
            issue.with_suggestion(format!("did you mean '/{path}'?"))
        } else {
            issue
        });
    }

    if config.forward.timeout == Some(0) {
        issues.push(
            ConfigIssue::new("forward", "timeout", "timeout must be greater than zero")
                .with_suggestion("remove the key to wait indefinitely"),
        );
    }

    if let Err(msg) = validate_cookie_name(&config.identity.cookie_name) {
        issues.push(ConfigIssue::new("identity", "cookie_name", msg));
    }

    if config.identity.field.is_empty() {
        issues.push(ConfigIssue::new("identity", "field", "field cannot be empty"));
    }

    if config.identity.fallback.is_empty() {
        issues.push(ConfigIssue::new(
            "identity",
            "fallback",
            "fallback cannot be empty",
        ));
    }

    let mut seen = HashSet::new();
    for (i, origin) in config.cors.allowed_origins.iter().enumerate() {
        let field = format!("allowed_origins[{i}]");
        if let Err(msg) = validate_origin(origin) {
            let issue = ConfigIssue::new("cors", &field, msg);
            let trimmed = origin.trim_end_matches('/');
            issues.push(if trimmed != origin && validate_origin(trimmed).is_ok() {
                issue.with_suggestion(format!("use '{trimmed}'"))
            } else {
                issue
            });
        }
        if !seen.insert(origin.as_str()) {
            issues.push(ConfigIssue::new("cors", &field, "duplicate origin"));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}
