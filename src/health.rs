//! Liveness and health endpoints.
//!
//! `GET /` answers with a fixed confirmation string. `GET /health`
//! returns a [`HealthResponse`] JSON payload with the server version,
//! uptime, forwarding host, and cumulative request statistics. Both
//! sit behind the identity middleware like every other route.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::server::AppState;

pub const LIVENESS_MESSAGE: &str = "Server is running!";

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub forward: ForwardHealth,
    pub stats: StatsResponse,
}

#[derive(Serialize, Deserialize)]
pub struct ForwardHealth {
    pub host: String,
    pub path: String,
    pub allowed_origins: usize,
}

#[derive(Serialize, Deserialize)]
pub struct StatsResponse {
    pub requests_forwarded: u64,
    pub requests_failed: u64,
    pub requests_rejected: u64,
    pub identities_minted: u64,
}

pub async fn liveness_handler() -> &'static str {
    LIVENESS_MESSAGE
}

pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let settings = &state.settings;
    let stats = &state.stats;

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        forward: ForwardHealth {
            host: settings.forward_url.host_str().unwrap_or_default().to_string(),
            path: settings.forward_path.clone(),
            allowed_origins: settings.allowed_origins.len(),
        },
        stats: StatsResponse {
            requests_forwarded: stats.forwarded.load(Ordering::Relaxed),
            requests_failed: stats.failed.load(Ordering::Relaxed),
            requests_rejected: stats.rejected.load(Ordering::Relaxed),
            identities_minted: stats.identities_minted.load(Ordering::Relaxed),
        },
    })
}
