//! Prometheus metrics for the gateway

use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, Counter, CounterVec, Encoder, Gauge,
    TextEncoder,
};

// ── Interceptor chain ────────────────────────────────────────────────────────

pub static CALLS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "warden_calls_total",
        "Calls seen by the interceptor chain",
        &["outcome"]
    )
    .unwrap()
});

// ── Event hub ────────────────────────────────────────────────────────────────

pub static AUDIT_EVENTS_DROPPED: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "warden_audit_events_dropped_total",
        "Audit events not delivered because a log subscriber was lagging"
    )
    .unwrap()
});

pub static LOG_SUBSCRIBERS: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!("warden_log_subscribers", "Live Logging streams").unwrap()
});

// ── Stats tracker ────────────────────────────────────────────────────────────

pub static STAT_SUBSCRIBERS: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!("warden_stat_subscribers", "Live Statistics streams").unwrap()
});

/// Render all registered metrics to Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&families, &mut buffer) {
        tracing::warn!("metrics encoding failed: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
