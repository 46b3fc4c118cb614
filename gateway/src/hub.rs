//! Fan-out of audit events to live log subscribers.
//!
//! Every subscriber owns a bounded channel. Publishing never waits: when a
//! subscriber's channel is full the event is dropped for that subscriber
//! only, so a slow operator stream can't stall the calls being audited.

use crate::metrics;
use crate::subscriber::SubscriberId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::mpsc::{self, error::TrySendError};
use warden_shared::AuditEvent;

/// Receiving end handed to a log subscriber.
pub type EventReceiver = mpsc::Receiver<Arc<AuditEvent>>;

/// Registry of log subscribers and their delivery channels.
#[derive(Debug)]
pub struct EventHub {
    capacity: usize,
    subscribers: RwLock<HashMap<SubscriberId, mpsc::Sender<Arc<AuditEvent>>>>,
}

impl EventHub {
    pub const DEFAULT_CAPACITY: usize = 16;

    /// Create a hub whose per-subscriber channels hold `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            subscribers: RwLock::new(HashMap::new()),
        }
    }

    /// Register `id`, replacing any previous registration under the same id.
    /// A replaced channel is closed.
    pub fn subscribe(&self, id: SubscriberId) -> EventReceiver {
        let (tx, rx) = mpsc::channel(self.capacity);
        let mut subs = self.subscribers.write().unwrap_or_else(PoisonError::into_inner);
        subs.insert(id, tx);
        metrics::LOG_SUBSCRIBERS.set(subs.len() as f64);
        tracing::debug!(subscriber = %id, "log subscriber registered");
        rx
    }

    /// Remove `id` and close its channel. No-op for unknown ids.
    pub fn unsubscribe(&self, id: SubscriberId) {
        let mut subs = self.subscribers.write().unwrap_or_else(PoisonError::into_inner);
        if subs.remove(&id).is_some() {
            metrics::LOG_SUBSCRIBERS.set(subs.len() as f64);
            tracing::debug!(subscriber = %id, "log subscriber removed");
        }
    }

    /// Offer `event` to every subscriber without blocking.
    ///
    /// Returns how many subscribers accepted it.
    pub fn publish(&self, event: AuditEvent) -> usize {
        let event = Arc::new(event);
        let subs = self.subscribers.read().unwrap_or_else(PoisonError::into_inner);

        let mut delivered = 0;
        for (id, tx) in subs.iter() {
            match tx.try_send(Arc::clone(&event)) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    metrics::AUDIT_EVENTS_DROPPED.inc();
                    tracing::trace!(subscriber = %id, "log subscriber lagging, event dropped");
                }
                // receiver gone, the stream task will unsubscribe shortly
                Err(TrySendError::Closed(_)) => {}
            }
        }
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
