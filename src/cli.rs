//! Command-line interface definitions using clap derive macros.
//!
//! Contains the top-level [`Cli`] parser, the [`Commands`] enum for
//! subcommands (run, init, validate, health), and their associated
//! argument structs. Every `run` flag has an environment variable
//! equivalent for container deployments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::Overrides;

#[derive(Parser)]
#[command(
    name = "tagrelay",
    version,
    about = "Webhook relay that tags tag-manager payloads with a persistent browser identity",
    propagate_version = true,
    after_help = "\x1b[1mQuick start:\x1b[0m\n  \
        tagrelay init                                   Create a starter config\n  \
        tagrelay run                                    Start with ./tagrelay.yaml\n  \
        tagrelay run --forward-url https://hooks...     Start without a config file"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the relay server
    Run(Box<RunArgs>),

    /// Generate a starter config file
    Init(InitArgs),

    /// Validate a config file without starting
    Validate(ValidateArgs),

    /// Check health of a running instance
    Health(HealthArgs),
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        tagrelay run                                          Auto-detect config\n  \
        tagrelay run -c relay.yaml -p 8080 --pretty           Local dev mode\n  \
        tagrelay run --forward-url https://hooks.example.com/catch/1/abc \\\n    \
            --allowed-origin https://shop.example.com         Flags only")]
pub struct RunArgs {
    /// Config file path (.yaml, .json, .toml)
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Listen port
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Listen address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    // -- Forwarding --
    /// Webhook URL receiving enriched payloads (overrides forward.url)
    #[arg(long, env = "FORWARD_URL", help_heading = "Forwarding")]
    pub forward_url: Option<String>,

    /// Origin allowed to make credentialed cross-origin requests (repeatable)
    #[arg(
        long = "allowed-origin",
        env = "ALLOWED_ORIGINS",
        value_delimiter = ',',
        help_heading = "Forwarding"
    )]
    pub allowed_origins: Vec<String>,

    /// Upstream timeout in milliseconds (default: wait indefinitely)
    #[arg(long, env = "FORWARD_TIMEOUT_MS", help_heading = "Forwarding")]
    pub timeout: Option<u64>,

    // -- Logging --
    /// Log level
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Force pretty (human-readable) log output
    #[arg(long)]
    pub pretty: bool,

    /// Force JSON log output (overrides TTY detection)
    #[arg(long, conflicts_with = "pretty")]
    pub json: bool,

    // -- Tuning --
    /// Max request body size in bytes
    #[arg(
        long,
        env = "MAX_BODY_SIZE",
        default_value_t = 1_048_576,
        help_heading = "Tuning"
    )]
    pub max_body: usize,
}

impl RunArgs {
    #[must_use]
    pub fn overrides(&self) -> Overrides {
        Overrides {
            forward_url: self.forward_url.clone(),
            allowed_origins: self.allowed_origins.clone(),
            timeout: self.timeout,
        }
    }
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        tagrelay init                              Minimal config (yaml)\n  \
        tagrelay init --full                       Every option documented\n  \
        tagrelay init -f toml -o relay.toml        TOML format")]
pub struct InitArgs {
    /// Output format
    #[arg(short, long, default_value = "yaml")]
    pub format: ConfigFormat,

    /// Output file path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Include full documentation as comments
    #[arg(long)]
    pub full: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Config file to validate
    #[arg(default_value = "tagrelay.yaml")]
    pub config: PathBuf,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: ValidateFormat,
}

#[derive(Args)]
pub struct HealthArgs {
    /// URL of the running instance
    #[arg(default_value = "http://localhost:3000")]
    pub url: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Toml => "toml",
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
pub enum ValidateFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_flags_map_to_overrides() {
        let cli = Cli::try_parse_from([
            "tagrelay",
            "run",
            "-p",
            "8080",
            "--forward-url",
            "https://hooks.example.com/catch/1/abc",
            "--timeout",
            "2500",
        ])
        .unwrap();
        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.port, 8080);
        let overrides = args.overrides();
        assert_eq!(
            overrides.forward_url.as_deref(),
            Some("https://hooks.example.com/catch/1/abc")
        );
        assert_eq!(overrides.timeout, Some(2500));
    }

    #[test]
    fn allowed_origins_accept_commas_and_repeats() {
        let cli = Cli::try_parse_from([
            "tagrelay",
            "run",
            "--allowed-origin",
            "https://a.example.com,https://b.example.com",
            "--allowed-origin",
            "https://c.example.com",
        ])
        .unwrap();
        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(
            args.overrides().allowed_origins,
            vec![
                "https://a.example.com",
                "https://b.example.com",
                "https://c.example.com"
            ]
        );
    }
}
