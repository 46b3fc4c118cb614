//! Per-subscriber call statistics.
//!
//! Each statistics subscriber owns a [`CallerCounters`] window. Every tracked
//! call increments every live window; [`StatTracker::pull`] hands the current
//! window to its owner and installs a fresh one in the same critical section.

use crate::metrics;
use crate::subscriber::SubscriberId;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use warden_shared::CallerCounters;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    #[error("stats subscriber {0} is not registered")]
    UnknownSubscriber(SubscriberId),
}

/// Registry of statistics subscribers and their open counter windows.
#[derive(Debug, Default)]
pub struct StatTracker {
    subscribers: Mutex<HashMap<SubscriberId, CallerCounters>>,
}

impl StatTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SubscriberId, CallerCounters>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a zeroed window for `id`, discarding any existing one.
    pub fn subscribe(&self, id: SubscriberId) {
        let mut subs = self.lock();
        subs.insert(id, CallerCounters::new());
        metrics::STAT_SUBSCRIBERS.set(subs.len() as f64);
    }

    /// Drop the window for `id`. No-op for unknown ids.
    pub fn unsubscribe(&self, id: SubscriberId) {
        let mut subs = self.lock();
        if subs.remove(&id).is_some() {
            metrics::STAT_SUBSCRIBERS.set(subs.len() as f64);
        }
    }

    /// Count one call in every open window.
    pub fn track(&self, method: &str, consumer: &str) {
        for counters in self.lock().values_mut() {
            counters.record(method, consumer);
        }
    }

    /// Take the window accumulated for `id` and start a new one.
    pub fn pull(&self, id: SubscriberId) -> Result<CallerCounters, StatsError> {
        let mut subs = self.lock();
        let window = subs.get_mut(&id).ok_or(StatsError::UnknownSubscriber(id))?;
        Ok(std::mem::take(window))
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_track_without_subscribers_is_noop() {
        let stats = StatTracker::new();
        stats.track("/a.B/C", "bob");
        assert_eq!(stats.subscriber_count(), 0);
    }

    #[test]
    fn test_pull_returns_window_and_resets() {
        let stats = StatTracker::new();
        let id = SubscriberId::next();
        stats.subscribe(id);

        stats.track("/a.B/C", "bob");
        stats.track("/a.B/C", "alice");

        let first = stats.pull(id).unwrap();
        assert_eq!(first.by_method["/a.B/C"], 2);
        assert_eq!(first.by_consumer["bob"], 1);
        assert_eq!(first.by_consumer["alice"], 1);

        let second = stats.pull(id).unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn test_track_after_pull_leaves_snapshot_untouched() {
        let stats = StatTracker::new();
        let id = SubscriberId::next();
        stats.subscribe(id);
        stats.track("/a.B/C", "bob");

        let snapshot = stats.pull(id).unwrap();
        stats.track("/a.B/D", "bob");

        assert_eq!(snapshot.total_calls(), 1);
        assert!(!snapshot.by_method.contains_key("/a.B/D"));
        assert_eq!(stats.pull(id).unwrap().by_method["/a.B/D"], 1);
    }

    #[test]
    fn test_every_subscriber_gets_its_own_window() {
        let stats = StatTracker::new();
        let early = SubscriberId::next();
        let late = SubscriberId::next();

        stats.subscribe(early);
        stats.track("/a.B/C", "bob");
        stats.subscribe(late);
        stats.track("/a.B/C", "bob");

        assert_eq!(stats.pull(early).unwrap().total_calls(), 2);
        assert_eq!(stats.pull(late).unwrap().total_calls(), 1);
    }

    #[test]
    fn test_pull_unknown_subscriber() {
        let stats = StatTracker::new();
        let id = SubscriberId::next();
        assert_eq!(stats.pull(id), Err(StatsError::UnknownSubscriber(id)));

        stats.subscribe(id);
        stats.unsubscribe(id);
        assert!(stats.pull(id).is_err());
    }

    #[test]
    fn test_resubscribe_resets_window() {
        let stats = StatTracker::new();
        let id = SubscriberId::next();
        stats.subscribe(id);
        stats.track("/a.B/C", "bob");
        stats.subscribe(id);
        assert!(stats.pull(id).unwrap().is_empty());
        assert_eq!(stats.subscriber_count(), 1);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let stats = StatTracker::new();
        let id = SubscriberId::next();
        stats.unsubscribe(id);
        stats.subscribe(id);
        stats.unsubscribe(id);
        stats.unsubscribe(id);
        assert_eq!(stats.subscriber_count(), 0);
    }

    #[test]
    fn test_concurrent_track_and_pull_loses_nothing() {
        let stats = Arc::new(StatTracker::new());
        let id = SubscriberId::next();
        stats.subscribe(id);

        let writers: Vec<_> = (0..4)
            .map(|w| {
                let stats = Arc::clone(&stats);
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        stats.track("/a.B/C", &format!("worker-{w}"));
                    }
                })
            })
            .collect();

        let mut total = 0;
        while writers.iter().any(|h| !h.is_finished()) {
            let window = stats.pull(id).unwrap();
            // a track lands whole in one window
            assert_eq!(
                window.by_method.values().sum::<u64>(),
                window.by_consumer.values().sum::<u64>()
            );
            total += window.total_calls();
        }
        for h in writers {
            h.join().unwrap();
        }
        total += stats.pull(id).unwrap().total_calls();

        assert_eq!(total, 4_000);
    }
}
