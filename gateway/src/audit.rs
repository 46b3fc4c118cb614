//! Audit logging for access decisions and admin activity.
//!
//! All records are emitted via `tracing` with a dedicated target so they can be
//! filtered and formatted (e.g. JSON) for audit pipelines. Denials are the
//! audit signal itself, not a fault, so they log at `info`.

use tracing::info;

const AUDIT_TARGET: &str = "warden::audit";

/// Log a call rejected by the allow-list.
pub fn call_denied(consumer: &str, method: &str, host: &str) {
    info!(
        target: AUDIT_TARGET,
        event = "call_denied",
        result = "denied",
        consumer = %consumer,
        method = %method,
        host = %host,
    );
}

/// Log an admin stream (Logging or Statistics) being opened.
pub fn admin_stream_opened(stream: &str, subscriber: u64) {
    info!(
        target: AUDIT_TARGET,
        event = "admin_stream_opened",
        stream = %stream,
        subscriber = subscriber,
    );
}

pub fn admin_stream_closed(stream: &str, subscriber: u64) {
    info!(
        target: AUDIT_TARGET,
        event = "admin_stream_closed",
        stream = %stream,
        subscriber = subscriber,
    );
}

/// Log admin HTTP request (metrics, health).
pub fn admin_http_request(path: &str, status: u16) {
    info!(
        target: AUDIT_TARGET,
        event = "admin_http_request",
        path = %path,
        status = %status,
    );
}
