//! Time-related utilities

use std::time::{SystemTime, UNIX_EPOCH};

/// Get the current system time in seconds since UNIX epoch.
///
/// A clock set before the epoch reads as 0 rather than failing the caller.
pub fn system_time_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
