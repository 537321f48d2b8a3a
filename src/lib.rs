//! In-memory named queues with long-polling consumers, served over HTTP.
//!
//! - [`daemon::services::queue`] - the queue registry (`put` / `get`)
//! - [`daemon::http`] - axum routers for the public and admin APIs
//! - [`config`] - TOML configuration and validation

pub mod config;
pub mod constants;
pub mod daemon;
