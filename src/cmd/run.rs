//! `tagrelay run` — start the relay server.
//!
//! Loads the optional config file, applies CLI / environment overrides,
//! freezes the result into [`Settings`], and serves the Axum router
//! until Ctrl+C or SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::cli::RunArgs;
use crate::config::model::Config;
use crate::config::{self, Settings};
use crate::error::RelayError;
use crate::logging;
use crate::server::{self, AppState};

pub async fn execute(args: RunArgs) -> Result<(), RelayError> {
    logging::init(
        &args.log_level,
        logging::resolve_format(args.pretty, args.json),
    );

    let settings = resolve_settings(&args).await?;
    let forward_host = settings
        .forward_url
        .host_str()
        .unwrap_or_default()
        .to_string();
    let forward_path = settings.forward_path.clone();
    let origins = settings.allowed_origins.len();

    let state = Arc::new(AppState::new(settings));
    let router = server::build_router(state, args.max_body);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        forward_host = %forward_host,
        forward_path = %forward_path,
        allowed_origins = origins,
        "tagrelay started"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(server::shutdown_signal())
        .await?;

    tracing::info!("tagrelay stopped");
    Ok(())
}

async fn resolve_settings(args: &RunArgs) -> Result<Settings, RelayError> {
    let mut config = match config::resolve_file(args.config.as_deref()).await {
        Some(path) => {
            let config = config::load_file(&path).await?;
            tracing::info!(path = %path.display(), "loaded config file");
            config
        }
        None => {
            tracing::debug!("no config file found, using flags and environment only");
            Config::default()
        }
    };

    args.overrides().apply(&mut config);
    Settings::from_config(&config)
}
