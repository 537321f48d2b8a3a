//! Core types for the queue service.
//!
//! Contains the message type, per-queue state (buffer plus waiter list)
//! and the statistics snapshot exposed to the admin API.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use tokio::sync::oneshot;

/// Serde helper for `DateTime<Utc>` as RFC3339 string.
pub(crate) mod datetime_rfc3339 {
    use chrono::{DateTime, Utc};
    use serde::Serializer;

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.to_rfc3339())
    }
}

/// Message in a queue with metadata.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct QueueMessage {
    /// Unique message identifier (UUID v4).
    pub id: String,
    /// Message payload. Never inspected by the broker.
    pub data: Vec<u8>,
    /// Timestamp when the message was accepted by `put`.
    #[serde(with = "datetime_rfc3339")]
    pub created_at: DateTime<Utc>,
}

impl QueueMessage {
    /// Wrap a payload, stamping it with a fresh id and the current time.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            data: data.into(),
            created_at: Utc::now(),
        }
    }
}

/// A suspended consumer registered on a queue (internal).
///
/// The sender half is the single-slot handoff: whoever removes the waiter
/// from [`Queue::waiters`] owns it and may send at most once.
#[derive(Debug)]
pub(crate) struct Waiter {
    pub(crate) id: u64,
    pub(crate) slot: oneshot::Sender<QueueMessage>,
}

/// A single named queue (internal).
#[derive(Debug, Default)]
pub(crate) struct Queue {
    /// Buffered messages, oldest first.
    pub(crate) messages: VecDeque<QueueMessage>,
    /// Registered waiters, oldest first.
    pub(crate) waiters: VecDeque<Waiter>,
}

impl Queue {
    /// Hand `message` to the oldest live waiter, or buffer it at the tail.
    ///
    /// Returns the id of the waiter that received it, if any.
    pub(crate) fn deliver(&mut self, message: QueueMessage) -> Option<u64> {
        match self.hand_off(message) {
            Ok(id) => Some(id),
            Err(message) => {
                self.messages.push_back(message);
                None
            },
        }
    }

    /// Like [`Queue::deliver`], but a buffered message goes to the head.
    ///
    /// Used to put back a message whose consumer vanished after the handoff
    /// was committed; it was already the oldest one in flight.
    pub(crate) fn redeliver(&mut self, message: QueueMessage) -> Option<u64> {
        match self.hand_off(message) {
            Ok(id) => Some(id),
            Err(message) => {
                self.messages.push_front(message);
                None
            },
        }
    }

    /// Send to waiters in registration order until one accepts.
    fn hand_off(&mut self, mut message: QueueMessage) -> Result<u64, QueueMessage> {
        while let Some(waiter) = self.waiters.pop_front() {
            match waiter.slot.send(message) {
                Ok(()) => return Ok(waiter.id),
                // Receiver dropped before its guard could deregister.
                Err(returned) => message = returned,
            }
        }
        Err(message)
    }

    /// Pop the oldest buffered message.
    pub(crate) fn pop(&mut self) -> Option<QueueMessage> {
        self.messages.pop_front()
    }

    /// Remove the waiter with `id`. Returns false if it was already claimed.
    pub(crate) fn remove_waiter(&mut self, id: u64) -> bool {
        match self.waiters.iter().position(|w| w.id == id) {
            Some(index) => {
                self.waiters.remove(index);
                true
            },
            None => false,
        }
    }

    /// Number of buffered messages.
    pub(crate) fn len(&self) -> usize {
        self.messages.len()
    }

    /// Neither buffered messages nor waiters: safe to drop from the registry.
    pub(crate) fn is_idle(&self) -> bool {
        self.messages.is_empty() && self.waiters.is_empty()
    }
}

/// Snapshot of a single queue.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct QueueStats {
    /// Queue name.
    pub name: String,
    /// Buffered messages.
    pub length: usize,
    /// Consumers currently long-polling.
    pub waiters: usize,
}

/// Configuration for the queue service.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Upper bound applied to every `get` timeout.
    pub max_wait: std::time::Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_wait: std::time::Duration::from_secs(crate::constants::DEFAULT_MAX_WAIT_SECS),
        }
    }
}
