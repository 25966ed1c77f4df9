//! HTTP surface for the proxy.
//!
//! - `config`: TOML configuration and secrets for the daemon
//! - `routes`: axum router, principal extraction and provenance headers

pub mod config;
pub mod routes;

pub use routes::{AppState, router};
