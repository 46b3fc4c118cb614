//! Audit event definitions
//!
//! One [`AuditEvent`] is produced for every call that reaches the gateway,
//! whether or not it is later authorized.

use crate::utils::time::system_time_secs;
use serde::{Deserialize, Serialize};

/// A single recorded call attempt. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Seconds since UNIX epoch when the call entered the gateway
    pub timestamp: i64,

    /// Caller identifier from call metadata (empty if absent)
    pub consumer: String,

    /// Fully qualified method, e.g. `/warden.v1.Biz/Check`
    pub method: String,

    /// Peer address of the caller (empty if unavailable)
    pub host: String,
}

impl AuditEvent {
    /// Build an event stamped with the current time.
    pub fn new(
        consumer: impl Into<String>,
        method: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: system_time_secs(),
            consumer: consumer.into(),
            method: method.into(),
            host: host.into(),
        }
    }
}
