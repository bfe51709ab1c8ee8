//! tagrelay is a webhook relay for tag-manager events.
//!
//! It accepts JSON payloads POSTed by a browser-side tag manager, stamps
//! each one with an anonymous per-browser identity kept in a long-lived
//! cookie, and forwards the result to a fixed automation webhook. The
//! webhook's response (or a structured error) is relayed back to the
//! caller.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution (run, init, validate, health).
//! - [`config`] -- Config file loading, CLI overrides, validation, and the
//!   frozen [`Settings`](config::Settings) shared by the server.
//! - [`error`] -- Unified error types using `thiserror`.
//! - [`health`] -- `GET /` liveness and `GET /health` diagnostics.
//! - [`identity`] -- Identity cookie read-or-mint and its axum middleware.
//! - [`logging`] -- Structured tracing setup with JSON and pretty-print output.
//! - [`relay`] -- Payload validation, identity enrichment, and the single-shot
//!   forward to the webhook with explicit response mapping.
//! - [`server`] -- Axum server setup, CORS, shared application state, HTTP
//!   client, and graceful shutdown.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `yaml` | YAML config file support _(enabled by default)_ |
//! | `json` | JSON config file support |
//! | `toml` | TOML config file support |
//! | `file-backends` | All file format backends |
//! | `full` | All features |

// Binary crate — public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod health;
pub mod identity;
pub mod logging;
pub mod relay;
pub mod server;
