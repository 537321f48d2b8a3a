//! Queue handlers.
//!
//! `PUT /{queue}?v=...` enqueues, `GET /{queue}?timeout=N` dequeues with
//! long polling. Input validation happens here; the queue service assumes
//! validated input.

use std::time::{Duration, Instant};

use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{Method, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use tracing::{debug, info};

use super::super::types::{GetQuery, PutQuery};
use super::super::{AppError, SharedState, metrics};

/// Queue name taken from the first non-empty path segment.
///
/// Surrounding slashes are ignored and anything after the first segment is
/// dropped, so `/jobs`, `/jobs/` and `/jobs/extra` all address `jobs`.
/// An empty name (`//`) is rejected with 400.
#[derive(Debug)]
pub(crate) struct QueueName(pub(crate) String);

impl<S> FromRequestParts<S> for QueueName
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(path) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(format!("invalid queue path: {e}")))?;

        match queue_name_from_path(&path) {
            Some(name) => Ok(Self(name.to_string())),
            None => Err(AppError::BadRequest("queue name is required".to_string())),
        }
    }
}

fn queue_name_from_path(path: &str) -> Option<&str> {
    path.trim_matches('/')
        .split('/')
        .next()
        .filter(|name| !name.is_empty())
}

/// PUT /{queue} - Enqueue the `v` query parameter.
pub(crate) async fn queue_put(
    State(state): State<SharedState>,
    QueueName(name): QueueName,
    Query(query): Query<PutQuery>,
) -> Result<StatusCode, AppError> {
    let Some(message) = query.v.filter(|v| !v.is_empty()) else {
        metrics::record_queue_operation("put", "invalid");
        return Err(AppError::BadRequest("parameter v is required".to_string()));
    };

    let id = state.queue.put(&name, message);
    metrics::record_queue_operation("put", "ok");
    info!(queue = %name, message_id = %id, "Message enqueued");

    Ok(StatusCode::OK)
}

/// GET /{queue} - Dequeue a message, waiting up to `timeout` seconds.
///
/// The wait ends early when the client disconnects (the handler future is
/// dropped) or the server shuts down.
pub(crate) async fn queue_get(
    State(state): State<SharedState>,
    QueueName(name): QueueName,
    Query(query): Query<GetQuery>,
) -> Result<Response, AppError> {
    let timeout = match parse_timeout(query.timeout.as_deref()) {
        Ok(timeout) => timeout,
        Err(e) => {
            metrics::record_queue_operation("get", "invalid");
            return Err(e);
        },
    };

    let start = Instant::now();
    let shutdown = state.shutdown.clone();
    let message = state
        .queue
        .get(&name, timeout, async move { shutdown.wait().await })
        .await;
    metrics::record_wait(start.elapsed());

    match message {
        Some(msg) => {
            metrics::record_queue_operation("get", "found");
            info!(queue = %name, message_id = %msg.id, "Message dequeued");
            Ok((
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                msg.data,
            )
                .into_response())
        },
        None => {
            metrics::record_queue_operation("get", "not_found");
            debug!(queue = %name, ?timeout, "No message within timeout");
            Err(AppError::NotFound("message not found".to_string()))
        },
    }
}

/// Any method on `/` - the queue name is part of the path and is required.
pub(crate) async fn missing_queue_name() -> AppError {
    AppError::BadRequest("queue name is required".to_string())
}

/// Any method other than GET or PUT on `/{queue}`.
pub(crate) async fn method_not_allowed(method: Method) -> AppError {
    debug!(%method, "Unsupported method");
    AppError::MethodNotAllowed
}

/// Parse the `timeout` query parameter as whole, non-negative seconds.
///
/// Absent or empty means zero: check once and do not wait.
fn parse_timeout(raw: Option<&str>) -> Result<Duration, AppError> {
    let invalid = |raw: &str| AppError::BadRequest(format!("invalid timeout parameter: {raw}"));

    match raw {
        None | Some("") => Ok(Duration::ZERO),
        // `u64::from_str` also takes a leading '+'
        Some(raw) if !raw.bytes().all(|b| b.is_ascii_digit()) => Err(invalid(raw)),
        Some(raw) => raw
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| invalid(raw)),
    }
}
