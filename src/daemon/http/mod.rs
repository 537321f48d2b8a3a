//! HTTP adapters around the queue service.
//!
//! Two routers share one [`AppState`]:
//!
//! - [`router`] - the public queue API
//!   - `PUT /{queue}?v=...` - enqueue (trailing segments are ignored)
//!   - `GET /{queue}?timeout=N` - dequeue, long-polling up to N seconds
//! - [`admin_router`] - diagnostics, served on a separate port
//!   - `GET /health`, `GET /queues`, `GET /metrics`

pub mod handlers;
pub(crate) mod metrics;
pub mod types;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::Request,
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, get},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{Instrument, info, info_span};

use super::services::queue::QueueService;
use super::shutdown::Shutdown;

/// Response header carrying the per-request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// State shared by every handler.
pub struct AppState {
    pub queue: QueueService,
    pub shutdown: Shutdown,
    pub started_at: Instant,
    /// Prometheus renderer; `None` when no recorder was installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(queue: QueueService, shutdown: Shutdown) -> Self {
        Self {
            queue,
            shutdown,
            started_at: Instant::now(),
            metrics: None,
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

pub type SharedState = Arc<AppState>;

/// Errors surfaced to HTTP clients as plain-text responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("unsupported method")]
    MethodNotAllowed,
    #[error("{0}")]
    ServiceUnavailable(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

/// Public queue API.
pub fn router(state: SharedState) -> Router {
    Router::new()
        // Catch-all so `/{queue}/...` and `//` reach the handlers, which take
        // the first path segment as the queue name.
        .route(
            "/{*path}",
            get(handlers::queue_get)
                .put(handlers::queue_put)
                // HEAD would otherwise be served by the GET handler and
                // consume a message.
                .head(handlers::method_not_allowed)
                .fallback(handlers::method_not_allowed),
        )
        .route("/", any(handlers::missing_queue_name))
        .layer(middleware::from_fn(request_span))
        .with_state(state)
}

/// Diagnostics API for the admin listener.
pub fn admin_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/queues", get(handlers::queue_stats))
        .route("/metrics", get(handlers::prometheus_metrics))
        .with_state(state)
}

/// Wrap each request in a span tagged with a fresh request id.
async fn request_span(req: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    let span = info_span!(
        "request",
        method = %req.method(),
        path = %req.uri().path(),
        request_id = %request_id,
    );

    let mut response = next.run(req).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Serve `app` on `listener` until the shutdown signal fires.
///
/// # Errors
///
/// Returns an error if the underlying server fails.
pub async fn serve(listener: TcpListener, app: Router, shutdown: Shutdown) -> Result<()> {
    let addr = listener.local_addr().context("Failed to read listener address")?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.wait().await })
        .await
        .with_context(|| format!("HTTP server on {addr} failed"))?;

    info!(%addr, "Stopped");
    Ok(())
}
