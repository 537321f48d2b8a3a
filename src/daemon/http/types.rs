//! Request and response bodies for the HTTP API.

use serde::{Deserialize, Serialize};

use crate::daemon::services::queue::QueueStats;

/// Query string of `PUT /{queue}`.
#[derive(Debug, Default, Deserialize)]
pub struct PutQuery {
    /// Message to enqueue.
    pub v: Option<String>,
}

/// Query string of `GET /{queue}`.
///
/// `timeout` is kept as text so that malformed values are reported as 400
/// with our own message instead of the extractor's rejection.
#[derive(Debug, Default, Deserialize)]
pub struct GetQuery {
    /// Seconds to wait; absent or empty means do not wait.
    pub timeout: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub queues: usize,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct QueueStatsResponse {
    pub queues: Vec<QueueStats>,
}
