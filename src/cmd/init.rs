//! `tagrelay init` — generate a starter configuration file.
//!
//! Creates a YAML, JSON, or TOML config file with either minimal
//! or fully documented templates.

use std::path::PathBuf;

use crate::cli::{ConfigFormat, InitArgs};
use crate::error::RelayError;

pub fn execute(args: &InitArgs) -> Result<(), RelayError> {
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("tagrelay.{}", args.format.extension())));

    if output.exists() {
        return Err(RelayError::FileExists { path: output });
    }

    std::fs::write(&output, template(&args.format, args.full))?;
    println!("Created {}", output.display());
    Ok(())
}

#[must_use]
pub const fn template(format: &ConfigFormat, full: bool) -> &'static str {
    match (format, full) {
        (ConfigFormat::Yaml, false) => YAML_MINIMAL,
        (ConfigFormat::Yaml, true) => YAML_FULL,
        (ConfigFormat::Json, false) => JSON_MINIMAL,
        (ConfigFormat::Json, true) => JSON_FULL,
        (ConfigFormat::Toml, false) => TOML_MINIMAL,
        (ConfigFormat::Toml, true) => TOML_FULL,
    }
}

const YAML_MINIMAL: &str = r#"# tagrelay config

forward:
  url: "https://hooks.zapier.com/hooks/catch/000000/abcdef/"

cors:
  allowed_origins:
    - "https://www.example.com"
"#;

const YAML_FULL: &str = r#"# tagrelay config
#
# Values shown commented out are defaults. Uncomment and modify as needed.

forward:
  # Webhook receiving the enriched payloads (required; --forward-url overrides)
  url: "https://hooks.zapier.com/hooks/catch/000000/abcdef/"
  # path: "/zapier-proxy"      # Local path accepting POSTed payloads
  # timeout: 10000             # Upstream timeout in ms (default: none)

# identity:
#   cookie_name: "userID"      # Cookie carrying the browser identity
#   field: "userID"            # Payload key the identity is written to
#   fallback: "unknown_user"   # Forwarded when no identity is available

cors:
  # Exact origins allowed to send credentialed requests (--allowed-origin overrides)
  allowed_origins:
    - "https://www.example.com"
"#;

const JSON_MINIMAL: &str = r#"{
  "forward": {
    "url": "https://hooks.zapier.com/hooks/catch/000000/abcdef/"
  },
  "cors": {
    "allowed_origins": ["https://www.example.com"]
  }
}
"#;

const JSON_FULL: &str = r#"{
  "forward": {
    "url": "https://hooks.zapier.com/hooks/catch/000000/abcdef/",
    "path": "/zapier-proxy",
    "timeout": 10000
  },
  "identity": {
    "cookie_name": "userID",
    "field": "userID",
    "fallback": "unknown_user"
  },
  "cors": {
    "allowed_origins": ["https://www.example.com"]
  }
}
"#;

const TOML_MINIMAL: &str = r#"# tagrelay config

[forward]
url = "https://hooks.zapier.com/hooks/catch/000000/abcdef/"

[cors]
allowed_origins = ["https://www.example.com"]
"#;

const TOML_FULL: &str = r#"# tagrelay config
#
# Values shown commented out are defaults. Uncomment and modify as needed.

[forward]
url = "https://hooks.zapier.com/hooks/catch/000000/abcdef/"
# path = "/zapier-proxy"
# timeout = 10000

# [identity]
# cookie_name = "userID"
# field = "userID"
# fallback = "unknown_user"

[cors]
allowed_origins = ["https://www.example.com"]
"#;
