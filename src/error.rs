//! Unified error types for tagrelay.
//!
//! Defines [`RelayError`] (the operational error enum surfaced by the
//! CLI) and [`ConfigIssue`] for config validation failures. Both use
//! `thiserror` for `Display` and `Error` derives where it fits. Error
//! messages include contextual hints to guide the user toward a fix.
//!
//! Request-level failures (bad payloads, upstream errors) live in
//! [`relay`](crate::relay) and never reach this type: they are turned
//! into HTTP responses and the server keeps serving.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    pub section: String,
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl ConfigIssue {
    pub fn new(section: &str, field: &str, message: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            field: field.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "  {}.{}: {}", self.section, self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigIssue {}

fn format_issues(issues: &[ConfigIssue]) -> String {
    use std::fmt::Write;
    let mut buf = String::new();
    for (i, issue) in issues.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
        }
        // write! to String is infallible (only fails on OOM which is unrecoverable)
        let _ = write!(buf, "{issue}");
    }
    buf
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RelayError {
    #[error("No forwarding endpoint configured.\n\n  {hint}")]
    NoForwardUrl { hint: String },

    #[error("Config file not found: {}", path.display())]
    ConfigFileNotFound { path: PathBuf },

    #[error("Config parse error in {path}:\n  {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Config validation failed:\n{}", format_issues(.issues))]
    ConfigValidation { issues: Vec<ConfigIssue> },

    #[error("Unsupported config format: '{0}'")]
    UnsupportedFormat(String),

    #[error("Invalid address: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    #[error("Invalid URI: {source}")]
    UriParse {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("HTTP request failed: {source}")]
    HttpRequest {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("File already exists: {}", path.display())]
    FileExists { path: PathBuf },

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Health check failed with status {0}")]
    HealthCheckFailed(hyper::StatusCode),
}
