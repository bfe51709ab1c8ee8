//! `tagrelay validate` — check a configuration file for errors.
//!
//! Parses and validates the config file, reporting results in either
//! human-readable text or machine-readable JSON format.

use crate::cli::{ValidateArgs, ValidateFormat};
use crate::config::parse_config_str;
use crate::config::validation;
use crate::error::RelayError;

pub fn execute(args: &ValidateArgs) -> Result<(), RelayError> {
    let path = &args.config;

    if !path.exists() {
        return Err(RelayError::ConfigFileNotFound { path: path.clone() });
    }

    let content = std::fs::read_to_string(path)?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let config = parse_config_str(ext, &content, &path.display().to_string())?;

    if let Err(issues) = validation::validate(&config) {
        match args.format {
            ValidateFormat::Text => {
                eprintln!("\u{2717} {} has {} errors\n", path.display(), issues.len());
                for issue in &issues {
                    eprintln!("{issue}");
                }
            }
            ValidateFormat::Json => {
                let json_issues: Vec<serde_json::Value> = issues
                    .iter()
                    .map(|i| {
                        serde_json::json!({
                            "section": i.section,
                            "field": i.field,
                            "message": i.message,
                            "suggestion": i.suggestion,
                        })
                    })
                    .collect();
                println!(
                    "{}",
                    serde_json::json!({ "valid": false, "errors": json_issues })
                );
            }
        }
        return Err(RelayError::ConfigValidation { issues });
    }

    let forward_url = config.forward.url.as_deref().unwrap_or_default();
    match args.format {
        ValidateFormat::Text => {
            println!("\u{2713} {} is valid", path.display());
            println!("  forward:  POST {} \u{2192} {forward_url}", config.forward.path);
            println!(
                "  identity: cookie '{}' \u{2192} field '{}'",
                config.identity.cookie_name, config.identity.field
            );
            println!("  origins:  {}", config.cors.allowed_origins.len());
        }
        ValidateFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "valid": true,
                    "forward_url": forward_url,
                    "forward_path": config.forward.path,
                    "allowed_origins": config.cors.allowed_origins.len(),
                })
            );
        }
    }

    Ok(())
}
