//! Prometheus metrics recorded by the HTTP layer.
//!
//! Recording is a no-op until a recorder is installed (see `main.rs`).
//! Queue names come from clients, so no instrument is labelled by queue:
//! per-queue detail is served by the admin `/queues` endpoint instead.

use std::time::Duration;

use crate::daemon::services::queue::QueueStats;

/// Count a queue operation by its outcome.
pub(crate) fn record_queue_operation(operation: &'static str, outcome: &'static str) {
    metrics::counter!(
        "queue_operations_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}

/// Time a `get` spent before returning.
pub(crate) fn record_wait(duration: Duration) {
    metrics::histogram!("queue_get_wait_seconds").record(duration.as_secs_f64());
}

/// Publish aggregate gauges from a stats snapshot.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn set_queue_gauges(stats: &[QueueStats]) {
    let buffered: usize = stats.iter().map(|q| q.length).sum();
    let waiting: usize = stats.iter().map(|q| q.waiters).sum();

    metrics::gauge!("queue_count").set(stats.len() as f64);
    metrics::gauge!("queue_buffered_messages").set(buffered as f64);
    metrics::gauge!("queue_waiting_consumers").set(waiting as f64);
}
