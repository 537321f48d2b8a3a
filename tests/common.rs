//! Shared test host for HTTP integration tests.
//!
//! `TestHost` runs the real public and admin routers on ephemeral ports of
//! 127.0.0.1 and shuts them down when dropped.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use queue_broker::daemon::http::{self, AppState, SharedState};
use queue_broker::daemon::services::queue::{QueueConfig, QueueService};
use queue_broker::daemon::shutdown::Shutdown;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Running broker bound to ephemeral ports.
pub struct TestHost {
    addr: SocketAddr,
    admin_addr: SocketAddr,
    client: reqwest::Client,
    state: SharedState,
    tasks: Vec<JoinHandle<anyhow::Result<()>>>,
}

/// Builder for [`TestHost`].
#[derive(Default)]
pub struct TestHostBuilder {
    queue_config: QueueConfig,
}

impl TestHostBuilder {
    /// Upper bound for long-polling gets.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.queue_config.max_wait = max_wait;
        self
    }

    pub async fn start(self) -> anyhow::Result<TestHost> {
        let shutdown = Shutdown::new();
        let state = Arc::new(AppState::new(
            QueueService::new(self.queue_config),
            shutdown.clone(),
        ));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let admin_listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let admin_addr = admin_listener.local_addr()?;

        let tasks = vec![
            tokio::spawn(http::serve(
                listener,
                http::router(state.clone()),
                shutdown.clone(),
            )),
            tokio::spawn(http::serve(
                admin_listener,
                http::admin_router(state.clone()),
                shutdown,
            )),
        ];

        Ok(TestHost {
            addr,
            admin_addr,
            client: reqwest::Client::new(),
            state,
            tasks,
        })
    }
}

impl TestHost {
    pub fn builder() -> TestHostBuilder {
        TestHostBuilder::default()
    }

    /// URL of `path` on the queue API.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// URL of `path` on the admin API.
    pub fn admin_url(&self, path: &str) -> String {
        format!("http://{}{}", self.admin_addr, path)
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// The queue service behind the routers.
    pub fn queue(&self) -> &QueueService {
        &self.state.queue
    }

    pub async fn get(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client.get(self.url(path)).send().await
    }

    pub async fn put(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client.put(self.url(path)).send().await
    }

    pub async fn admin_get(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client.get(self.admin_url(path)).send().await
    }

    /// Trigger graceful shutdown of both listeners.
    pub fn shutdown(&self) {
        self.state.shutdown.trigger();
    }

    /// Wait until `queue` has `count` registered waiters.
    pub async fn wait_for_waiters(&self, queue: &str, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.queue().waiter_count(queue) != count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| {
            panic!(
                "queue '{queue}' never reached {count} waiters (has {})",
                self.queue().waiter_count(queue)
            )
        });
    }
}

impl Drop for TestHost {
    fn drop(&mut self) {
        self.state.shutdown.trigger();
        for task in &self.tasks {
            task.abort();
        }
    }
}
