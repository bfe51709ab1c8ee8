//! Shared harness: a stub webhook and a relay pointed at it.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use tokio::sync::Mutex;

use tagrelay::config::model::Config;
use tagrelay::config::Settings;
use tagrelay::server::{self, AppState};

pub const ORIGIN: &str = "https://shop.example.com";

#[derive(Clone)]
pub struct StubReply {
    pub status: StatusCode,
    pub body: Value,
    pub delay: Option<Duration>,
}

impl Default for StubReply {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            body: serde_json::json!({ "status": "success" }),
            delay: None,
        }
    }
}

#[derive(Clone)]
struct StubState {
    received: Arc<Mutex<Vec<Value>>>,
    reply: StubReply,
}

pub struct Upstream {
    pub addr: SocketAddr,
    received: Arc<Mutex<Vec<Value>>>,
    shutdown: tokio::sync::oneshot::Sender<()>,
}

impl Upstream {
    pub fn url(&self) -> String {
        format!("http://{}/hooks/catch/1/abc/", self.addr)
    }

    pub async fn received(&self) -> Vec<Value> {
        self.received.lock().await.clone()
    }

    pub fn stop(self) {
        let _ = self.shutdown.send(());
    }
}

async fn stub_handler(
    State(stub): State<StubState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    stub.received.lock().await.push(body);
    if let Some(delay) = stub.reply.delay {
        tokio::time::sleep(delay).await;
    }
    (stub.reply.status, Json(stub.reply.body.clone()))
}

pub async fn start_upstream(reply: StubReply) -> Upstream {
    let received = Arc::new(Mutex::new(Vec::new()));
    let router = Router::new()
        .route("/hooks/catch/1/abc/", post(stub_handler))
        .with_state(StubState {
            received: Arc::clone(&received),
            reply,
        });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });

    Upstream {
        addr,
        received,
        shutdown: shutdown_tx,
    }
}

/// An address nothing listens on.
pub async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/hooks/catch/1/abc/")
}

pub fn test_config(forward_url: &str) -> Config {
    let mut config = Config::default();
    config.forward.url = Some(forward_url.into());
    config.cors.allowed_origins = vec![ORIGIN.into()];
    config
}

pub async fn start_relay(config: &Config) -> (SocketAddr, tokio::sync::oneshot::Sender<()>) {
    let settings = Settings::from_config(config).unwrap();
    let state = Arc::new(AppState::new(settings));
    let router = server::build_router(state, 1_048_576);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });

    (addr, shutdown_tx)
}

/// All `Set-Cookie` values on a response.
pub fn set_cookies(resp: &reqwest::Response) -> Vec<String> {
    resp.headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(String::from)
        .collect()
}

/// Value of the identity cookie set on a response, if any.
pub fn identity_cookie(resp: &reqwest::Response) -> Option<String> {
    set_cookies(resp).iter().find_map(|c| {
        c.strip_prefix("userID=")
            .and_then(|rest| rest.split(';').next())
            .map(String::from)
    })
}
