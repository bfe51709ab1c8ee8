//! Configuration loading, overrides, and the resolved runtime view.
//!
//! A config file (YAML by default, JSON and TOML behind features) is
//! optional: CLI flags and environment variables can supply or override
//! the forwarding URL, the CORS allow-list, and the upstream timeout.
//! The merged [`Config`] is validated once and frozen into [`Settings`],
//! which the server shares read-only for its whole lifetime.

pub mod model;
pub mod validation;

use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::http::HeaderValue;
use url::Url;

use crate::error::{ConfigIssue, RelayError};
use crate::identity::IdentityPolicy;
use model::Config;

/// File names probed in the working directory when no `--config` is given.
pub const CONFIG_CANDIDATES: &[&str] = &[
    "tagrelay.yaml",
    "tagrelay.yml",
    "tagrelay.json",
    "tagrelay.toml",
];

/// Parse a config string based on file extension.
pub fn parse_config_str(
    ext: &str,
    content: &str,
    path_display: &str,
) -> Result<Config, RelayError> {
    match ext {
        #[cfg(feature = "yaml")]
        "yaml" | "yml" => serde_yml::from_str(content).map_err(|e| RelayError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        #[cfg(feature = "json")]
        "json" => serde_json::from_str(content).map_err(|e| RelayError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        #[cfg(feature = "toml")]
        "toml" => toml::from_str(content).map_err(|e| RelayError::ConfigParse {
            path: path_display.to_string(),
            source: Box::new(e),
        }),

        other => Err(RelayError::UnsupportedFormat(other.to_string())),
    }
}

/// Read and parse a config file. Validation is left to the caller so
/// CLI overrides can fill in missing values first.
pub async fn load_file(path: &Path) -> Result<Config, RelayError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            RelayError::ConfigFileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            RelayError::Io(e)
        }
    })?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    parse_config_str(ext, &content, &path.display().to_string())
}

/// Return the explicit path, or the first candidate present in the working directory.
pub async fn resolve_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    for name in CONFIG_CANDIDATES {
        let path = PathBuf::from(name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::info!(path = %path.display(), "auto-detected config file");
            return Some(path);
        }
    }

    None
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub forward_url: Option<String>,
    pub allowed_origins: Vec<String>,
    pub timeout: Option<u64>,
}

impl Overrides {
    pub fn apply(&self, config: &mut Config) {
        if let Some(ref url) = self.forward_url {
            config.forward.url = Some(url.clone());
        }
        if !self.allowed_origins.is_empty() {
            config.cors.allowed_origins.clone_from(&self.allowed_origins);
        }
        if let Some(timeout) = self.timeout {
            config.forward.timeout = Some(timeout);
        }
    }
}

/// Validated, immutable runtime configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub forward_url: Url,
    pub forward_path: String,
    pub timeout: Option<Duration>,
    pub identity: IdentityPolicy,
    pub allowed_origins: Vec<HeaderValue>,
}

impl Settings {
    pub fn from_config(config: &Config) -> Result<Self, RelayError> {
        if config.forward.url.is_none() {
            return Err(RelayError::NoForwardUrl {
                hint: "Set forward.url in the config file or pass --forward-url <URL>.\n  \
                       Run 'tagrelay init' to create a config file."
                    .into(),
            });
        }

        validation::validate(config).map_err(|issues| RelayError::ConfigValidation { issues })?;

        let raw_url = config.forward.url.as_deref().unwrap_or_default();
        let forward_url = Url::parse(raw_url).map_err(|e| RelayError::UriParse {
            source: Box::new(e),
        })?;

        let allowed_origins = config
            .cors
            .allowed_origins
            .iter()
            .enumerate()
            .map(|(i, origin)| {
                HeaderValue::from_str(origin).map_err(|_| RelayError::ConfigValidation {
                    issues: vec![ConfigIssue::new(
                        "cors",
                        &format!("allowed_origins[{i}]"),
                        "origin is not a valid header value",
                    )],
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            forward_url,
            forward_path: config.forward.path.clone(),
            timeout: config.forward.timeout.map(Duration::from_millis),
            identity: IdentityPolicy::from(&config.identity),
            allowed_origins,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_url(url: &str) -> Config {
        let mut config = Config::default();
        config.forward.url = Some(url.into());
        config
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut config = config_with_url("https://a.example.com/hook");
        config.cors.allowed_origins = vec!["https://old.example.com".into()];

        Overrides {
            forward_url: Some("https://b.example.com/hook".into()),
            allowed_origins: vec!["https://new.example.com".into()],
            timeout: Some(2500),
        }
        .apply(&mut config);

        assert_eq!(config.forward.url.as_deref(), Some("https://b.example.com/hook"));
        assert_eq!(config.cors.allowed_origins, vec!["https://new.example.com"]);
        assert_eq!(config.forward.timeout, Some(2500));
    }

    #[test]
    fn empty_overrides_keep_file_values() {
        let mut config = config_with_url("https://a.example.com/hook");
        config.cors.allowed_origins = vec!["https://old.example.com".into()];
        Overrides::default().apply(&mut config);
        assert_eq!(config.forward.url.as_deref(), Some("https://a.example.com/hook"));
        assert_eq!(config.cors.allowed_origins.len(), 1);
    }

    #[test]
    fn settings_require_forward_url() {
        let err = Settings::from_config(&Config::default()).unwrap_err();
        assert!(matches!(err, RelayError::NoForwardUrl { .. }));
    }

    #[test]
    fn settings_resolve_defaults() {
        let settings =
            Settings::from_config(&config_with_url("https://a.example.com/hook")).unwrap();
        assert_eq!(settings.forward_url.host_str(), Some("a.example.com"));
        assert_eq!(settings.forward_path, "/zapier-proxy");
        assert_eq!(settings.timeout, None);
        assert_eq!(settings.identity, IdentityPolicy::default());
        assert!(settings.allowed_origins.is_empty());
    }

    #[test]
    fn settings_reject_invalid_config() {
        let mut config = config_with_url("https://a.example.com/hook");
        config.forward.path = "/health".into();
        let err = Settings::from_config(&config).unwrap_err();
        assert!(matches!(err, RelayError::ConfigValidation { .. }));
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn parses_yaml() {
        let config = parse_config_str(
            "yaml",
            "forward:\n  url: https://a.example.com/hook\n  timeout: 3000\n",
            "inline.yaml",
        )
        .unwrap();
        assert_eq!(config.forward.timeout, Some(3000));
        assert_eq!(config.identity.cookie_name, "userID");
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn unknown_keys_rejected() {
        let err = parse_config_str("yaml", "forward:\n  uri: nope\n", "inline.yaml").unwrap_err();
        assert!(matches!(err, RelayError::ConfigParse { .. }));
    }

    #[test]
    fn unknown_extension_rejected() {
        let err = parse_config_str("ini", "", "relay.ini").unwrap_err();
        assert!(matches!(err, RelayError::UnsupportedFormat(ext) if ext == "ini"));
    }
}
