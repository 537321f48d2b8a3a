//! Main queue service implementation.
//!
//! Provides the public `QueueService` API: non-blocking `put`, long-polling
//! `get`, and read-only introspection used by the admin endpoints.
//!
//! # Locking
//!
//! Every buffer and waiter-list mutation happens under `inner.queues`.
//! The oneshot slot inside a [`Waiter`] is the only state touched outside
//! the lock, and only by the side that removed the waiter from the list:
//! `put` sends into the slot while still holding the lock, so a consumer
//! that later takes the lock and finds its waiter gone is guaranteed to
//! find the message already in the slot.

use super::types::{Queue, QueueConfig, QueueMessage, QueueStats, Waiter};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Internal state for the queue service.
pub(crate) struct QueueServiceInner {
    /// All live queues indexed by name. Idle entries are removed.
    pub(crate) queues: Mutex<HashMap<String, Queue>>,
    /// Source of waiter ids, unique for the lifetime of the service.
    pub(crate) next_waiter_id: AtomicU64,
    /// Configuration.
    pub(crate) config: QueueConfig,
}

/// In-memory queue registry with direct handoff to long-polling consumers.
///
/// Cloning is cheap; all clones share the same queues.
#[derive(Clone)]
pub struct QueueService {
    pub(crate) inner: Arc<QueueServiceInner>,
}

/// Why a suspended `get` woke up.
enum Wake {
    Delivered(Result<QueueMessage, oneshot::error::RecvError>),
    TimedOut,
    Cancelled,
}

impl QueueService {
    /// Create a new queue service.
    pub fn new(config: QueueConfig) -> Self {
        Self {
            inner: Arc::new(QueueServiceInner {
                queues: Mutex::new(HashMap::new()),
                next_waiter_id: AtomicU64::new(1),
                config,
            }),
        }
    }

    /// Enqueue a message.
    ///
    /// If a consumer is already waiting on `queue_name`, the oldest one
    /// receives the message directly and nothing is buffered. Never blocks.
    ///
    /// Returns the id assigned to the message.
    pub fn put(&self, queue_name: &str, message: impl Into<Vec<u8>>) -> String {
        let msg = QueueMessage::new(message);
        let msg_id = msg.id.clone();

        let mut queues = self.inner.queues.lock();
        let queue = queues.entry(queue_name.to_string()).or_default();
        match queue.deliver(msg) {
            Some(waiter) => {
                debug!(queue = queue_name, message_id = %msg_id, waiter, "handed off to waiter");
                release_if_idle(&mut queues, queue_name);
            },
            None => {
                debug!(queue = queue_name, message_id = %msg_id, "buffered");
            },
        }

        msg_id
    }

    /// Dequeue a message, waiting up to `timeout` for one to arrive.
    ///
    /// A buffered message is returned immediately. Otherwise, with a zero
    /// timeout, returns `None` without waiting. With a non-zero timeout the
    /// caller is registered as a waiter and released by whichever comes
    /// first: a `put` on the same queue, the timeout, or `cancel` resolving.
    ///
    /// `timeout` is clamped to [`QueueConfig::max_wait`].
    ///
    /// If a `put` commits a message to this caller at the same moment the
    /// timeout or cancellation fires, the message is returned rather than
    /// dropped. If the returned future is dropped mid-wait, the waiter is
    /// deregistered, and a message already committed to it is put back at
    /// the head of the queue.
    pub async fn get<F>(
        &self,
        queue_name: &str,
        timeout: Duration,
        cancel: F,
    ) -> Option<QueueMessage>
    where
        F: Future<Output = ()>,
    {
        let timeout = timeout.min(self.inner.config.max_wait);

        let mut guard = {
            let mut queues = self.inner.queues.lock();
            if let Some(msg) = queues.get_mut(queue_name).and_then(Queue::pop) {
                release_if_idle(&mut queues, queue_name);
                debug!(queue = queue_name, message_id = %msg.id, "dequeued from buffer");
                return Some(msg);
            }

            if timeout.is_zero() {
                return None;
            }

            let id = self.inner.next_waiter_id.fetch_add(1, Ordering::Relaxed);
            let (slot, rx) = oneshot::channel();
            queues
                .entry(queue_name.to_string())
                .or_default()
                .waiters
                .push_back(Waiter { id, slot });
            debug!(queue = queue_name, waiter = id, ?timeout, "waiter registered");

            WaitGuard {
                service: self,
                queue_name,
                id,
                rx,
                resolved: false,
            }
        };

        let wake = tokio::select! {
            biased;
            received = &mut guard.rx => Wake::Delivered(received),
            () = tokio::time::sleep(timeout) => Wake::TimedOut,
            () = cancel => Wake::Cancelled,
        };

        match wake {
            Wake::Delivered(Ok(msg)) => {
                guard.resolved = true;
                Some(msg)
            },
            Wake::Delivered(Err(_)) => guard.abandon("sender dropped"),
            Wake::TimedOut => guard.abandon("timed out"),
            Wake::Cancelled => guard.abandon("cancelled"),
        }
    }

    /// Number of buffered messages in a queue.
    pub fn len(&self, queue_name: &str) -> usize {
        let queues = self.inner.queues.lock();
        queues.get(queue_name).map_or(0, Queue::len)
    }

    /// Check if a queue has no buffered messages.
    pub fn is_empty(&self, queue_name: &str) -> bool {
        self.len(queue_name) == 0
    }

    /// Number of consumers currently waiting on a queue.
    pub fn waiter_count(&self, queue_name: &str) -> usize {
        let queues = self.inner.queues.lock();
        queues.get(queue_name).map_or(0, |q| q.waiters.len())
    }

    /// List the names of all queues holding messages or waiters.
    pub fn list_queues(&self) -> Vec<String> {
        let queues = self.inner.queues.lock();
        queues.keys().cloned().collect()
    }

    /// Number of queues holding messages or waiters.
    pub fn queue_count(&self) -> usize {
        self.inner.queues.lock().len()
    }

    /// Snapshot every live queue, sorted by name.
    pub fn stats(&self) -> Vec<QueueStats> {
        let mut stats: Vec<QueueStats> = {
            let queues = self.inner.queues.lock();
            queues
                .iter()
                .map(|(name, q)| QueueStats {
                    name: name.clone(),
                    length: q.len(),
                    waiters: q.waiters.len(),
                })
                .collect()
        };
        stats.sort_by(|a, b| a.name.cmp(&b.name));
        stats
    }
}

/// Drop a queue entry that has neither messages nor waiters.
fn release_if_idle(queues: &mut HashMap<String, Queue>, queue_name: &str) {
    if queues.get(queue_name).is_some_and(Queue::is_idle) {
        queues.remove(queue_name);
    }
}

/// Owns a registered waiter until its `get` call resolves.
///
/// Dropping an unresolved guard deregisters the waiter, so a consumer
/// future that is dropped (client disconnect) never stays registered.
struct WaitGuard<'a> {
    service: &'a QueueService,
    queue_name: &'a str,
    id: u64,
    rx: oneshot::Receiver<QueueMessage>,
    resolved: bool,
}

impl WaitGuard<'_> {
    /// Timeout/cancel path: deregister, or collect the message a concurrent
    /// `put` already committed to this waiter.
    fn abandon(&mut self, reason: &'static str) -> Option<QueueMessage> {
        self.resolved = true;
        let service = self.service;
        let mut queues = service.inner.queues.lock();

        if let Some(queue) = queues.get_mut(self.queue_name)
            && queue.remove_waiter(self.id)
        {
            release_if_idle(&mut queues, self.queue_name);
            debug!(queue = self.queue_name, waiter = self.id, reason, "waiter abandoned");
            return None;
        }

        // Claimed by `put`, which sent under the lock we now hold.
        match self.rx.try_recv() {
            Ok(msg) => {
                debug!(
                    queue = self.queue_name,
                    waiter = self.id,
                    message_id = %msg.id,
                    reason,
                    "message committed before release; returning it"
                );
                Some(msg)
            },
            Err(_) => None,
        }
    }
}

impl Drop for WaitGuard<'_> {
    fn drop(&mut self) {
        if self.resolved {
            return;
        }

        let service = self.service;
        let mut queues = service.inner.queues.lock();
        if let Some(queue) = queues.get_mut(self.queue_name)
            && queue.remove_waiter(self.id)
        {
            release_if_idle(&mut queues, self.queue_name);
            debug!(queue = self.queue_name, waiter = self.id, "waiter dropped");
            return;
        }

        if let Ok(msg) = self.rx.try_recv() {
            warn!(
                queue = self.queue_name,
                waiter = self.id,
                message_id = %msg.id,
                "consumer dropped after handoff; re-delivering message"
            );
            let queue = queues.entry(self.queue_name.to_string()).or_default();
            queue.redeliver(msg);
            release_if_idle(&mut queues, self.queue_name);
        }
    }
}
