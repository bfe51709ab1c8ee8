//! Serde data structures for the tagrelay configuration file.
//!
//! Contains [`Config`] (the root), [`ForwardConfig`], [`IdentityConfig`],
//! and [`CorsConfig`]. All types derive `Serialize` and `Deserialize`
//! with `deny_unknown_fields` for strict parsing.

use serde::{Deserialize, Serialize};

pub const DEFAULT_FORWARD_PATH: &str = "/zapier-proxy";
pub const DEFAULT_COOKIE_NAME: &str = "userID";
pub const DEFAULT_IDENTITY_FIELD: &str = "userID";
pub const DEFAULT_FALLBACK_IDENTITY: &str = "unknown_user";

fn default_forward_path() -> String {
    DEFAULT_FORWARD_PATH.to_string()
}

fn default_cookie_name() -> String {
    DEFAULT_COOKIE_NAME.to_string()
}

fn default_identity_field() -> String {
    DEFAULT_IDENTITY_FIELD.to_string()
}

fn default_fallback_identity() -> String {
    DEFAULT_FALLBACK_IDENTITY.to_string()
}

fn is_default_forward_path(v: &str) -> bool {
    v == DEFAULT_FORWARD_PATH
}

fn is_default_identity(v: &IdentityConfig) -> bool {
    v.cookie_name == DEFAULT_COOKIE_NAME
        && v.field == DEFAULT_IDENTITY_FIELD
        && v.fallback == DEFAULT_FALLBACK_IDENTITY
}

fn is_default_cors(v: &CorsConfig) -> bool {
    v.allowed_origins.is_empty()
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub forward: ForwardConfig,

    #[serde(default, skip_serializing_if = "is_default_identity")]
    pub identity: IdentityConfig,

    #[serde(default, skip_serializing_if = "is_default_cors")]
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ForwardConfig {
    /// Third-party webhook receiving the enriched payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Local path accepting inbound payloads.
    #[serde(
        default = "default_forward_path",
        skip_serializing_if = "is_default_forward_path"
    )]
    pub path: String,

    /// Upstream timeout in milliseconds. Unset means wait indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            url: None,
            path: default_forward_path(),
            timeout: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Payload key the identity token is written to.
    #[serde(default = "default_identity_field")]
    pub field: String,

    /// Value forwarded when no identity could be resolved.
    #[serde(default = "default_fallback_identity")]
    pub fallback: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            field: default_identity_field(),
            fallback: default_fallback_identity(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_origins: Vec<String>,
}
