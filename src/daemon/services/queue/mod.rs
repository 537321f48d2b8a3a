//! In-memory named queues with long-polling consumers.
//!
//! Queues are created on first use. A `put` on a queue that has waiting
//! consumers hands the message straight to the oldest one; otherwise the
//! message is buffered. A `get` returns the oldest buffered message, or
//! waits for a `put`, a timeout, or a cancellation signal, whichever comes
//! first.
//!
//! # Examples
//!
//! ## Buffered Messages
//!
//! ```rust
//! use queue_broker::daemon::services::queue::{QueueConfig, QueueService};
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let service = QueueService::new(QueueConfig::default());
//!
//! service.put("tasks", "process this");
//! service.put("tasks", "then process this");
//!
//! // FIFO order, no waiting needed
//! let msg = service
//!     .get("tasks", Duration::ZERO, std::future::pending())
//!     .await
//!     .unwrap();
//! assert_eq!(msg.data, b"process this");
//! # }
//! ```
//!
//! ## Long Polling
//!
//! ```rust
//! use queue_broker::daemon::services::queue::{QueueConfig, QueueService};
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let service = QueueService::new(QueueConfig::default());
//!
//! let producer = service.clone();
//! tokio::spawn(async move {
//!     tokio::time::sleep(Duration::from_millis(20)).await;
//!     producer.put("events", "something happened");
//! });
//!
//! // Suspends until the producer's put arrives
//! let msg = service
//!     .get("events", Duration::from_secs(5), std::future::pending())
//!     .await
//!     .unwrap();
//! assert_eq!(msg.data, b"something happened");
//! # }
//! ```

mod service;
mod types;

// Re-export public API
pub use service::QueueService;
pub use types::{QueueConfig, QueueMessage, QueueStats};


#[cfg(test)]
mod property_tests;
