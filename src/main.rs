//! queue-broker - in-memory named queues with long-polling consumers.
//!
//! ```text
//! queue-broker [--config PATH] [--host IP] [--port N] [--admin-port N] [--log-format text|json]
//! ```

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use queue_broker::config::Config;
use queue_broker::daemon::http::{self, AppState};
use queue_broker::daemon::services::queue::QueueService;
use queue_broker::daemon::shutdown::{self, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "queue-broker", version, about)]
struct Cli {
    /// Path to a TOML config file (default: ./queue-broker.toml if present)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Bind address for both listeners
    #[arg(long)]
    host: Option<String>,

    /// Port of the queue API
    #[arg(long, short)]
    port: Option<u16>,

    /// Port of the admin API (health, metrics, queue stats); 0 disables it
    #[arg(long)]
    admin_port: Option<u16>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let mut config = Config::load_or_default(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(admin_port) = cli.admin_port {
        config.server.admin_port = admin_port;
    }

    let validation = config.validate()?;
    if validation.has_warnings() {
        warn!(count = validation.warnings.len(), "Configuration has warnings");
        for warning in &validation.warnings {
            warn!("{warning}");
        }
    }

    let shutdown = Shutdown::new();
    let queue = QueueService::new(config.queue_config());
    let mut state = AppState::new(queue, shutdown.clone());

    let admin_addr = config.admin_addr()?;
    if admin_addr.is_some() {
        let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        state = state.with_metrics(handle);
    }
    let state = Arc::new(state);

    let addr = config.listen_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind queue API on {addr}"))?;
    info!(%addr, "Queue API endpoints:");
    info!("  PUT /{{queue}}?v=<message>   enqueue a message");
    info!("  GET /{{queue}}?timeout=<secs> dequeue, waiting up to <secs>");

    tokio::spawn(shutdown::listen_for_signals(shutdown.clone()));

    let api = http::serve(listener, http::router(state.clone()), shutdown.clone());

    match admin_addr {
        Some(admin_addr) => {
            let admin_listener = TcpListener::bind(admin_addr)
                .await
                .with_context(|| format!("Failed to bind admin API on {admin_addr}"))?;
            info!(addr = %admin_addr, "Admin endpoints: /health /queues /metrics");
            let admin = http::serve(admin_listener, http::admin_router(state), shutdown);
            tokio::try_join!(api, admin)?;
        },
        None => api.await?,
    }

    info!("Shutdown complete");
    Ok(())
}

/// Initialize tracing with `RUST_LOG` filtering (default: info).
fn init_tracing(format: LogFormat) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry.with(fmt::layer()).init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }
}
