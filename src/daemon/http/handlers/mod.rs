//! HTTP API handlers organized by surface.

pub mod admin;
pub mod queue;

// Re-export all handlers for use in routing
pub(crate) use admin::{health, prometheus_metrics, queue_stats};
pub(crate) use queue::{method_not_allowed, missing_queue_name, queue_get, queue_put};
