//! Per-subscriber call counters

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Call tallies accumulated for one statistics subscriber between pulls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerCounters {
    /// Calls per fully qualified method
    pub by_method: HashMap<String, u64>,

    /// Calls per caller identifier (empty string for anonymous callers)
    pub by_consumer: HashMap<String, u64>,
}

impl CallerCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one call of `method` made by `consumer`.
    pub fn record(&mut self, method: &str, consumer: &str) {
        // get_mut first so the steady state doesn't allocate a key per call
        match self.by_method.get_mut(method) {
            Some(n) => *n += 1,
            None => {
                self.by_method.insert(method.to_string(), 1);
            }
        }
        match self.by_consumer.get_mut(consumer) {
            Some(n) => *n += 1,
            None => {
                self.by_consumer.insert(consumer.to_string(), 1);
            }
        }
    }

    /// Total number of recorded calls.
    pub fn total_calls(&self) -> u64 {
        self.by_method.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_method.is_empty() && self.by_consumer.is_empty()
    }
}

/// Counters as emitted on a statistics stream, stamped with the pull time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatSnapshot {
    /// Seconds since UNIX epoch when the counters were pulled
    pub timestamp: i64,

    #[serde(flatten)]
    pub counters: CallerCounters,
}
