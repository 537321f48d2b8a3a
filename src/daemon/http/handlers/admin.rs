//! Admin handlers: health, queue introspection and Prometheus metrics.

use axum::{Json, extract::State, http::header, response::IntoResponse};

use super::super::types::{HealthResponse, QueueStatsResponse};
use super::super::{AppError, SharedState, metrics};

/// GET /health - Liveness and a short summary.
pub(crate) async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let status = if state.shutdown.is_triggered() {
        "shutting_down"
    } else {
        "ok"
    };

    Json(HealthResponse {
        status: status.to_string(),
        queues: state.queue.queue_count(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

/// GET /queues - Buffered length and waiter count of every live queue.
pub(crate) async fn queue_stats(State(state): State<SharedState>) -> Json<QueueStatsResponse> {
    let queues = state.queue.stats();
    metrics::set_queue_gauges(&queues);
    Json(QueueStatsResponse { queues })
}

/// GET /metrics - Prometheus text exposition.
pub(crate) async fn prometheus_metrics(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, AppError> {
    let handle = state.metrics.as_ref().ok_or_else(|| {
        AppError::ServiceUnavailable("metrics recorder is not installed".to_string())
    })?;

    metrics::set_queue_gauges(&state.queue.stats());

    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    ))
}
