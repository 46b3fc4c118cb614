//! Output formatting utilities for CLI commands

use colored::Colorize;
use std::collections::HashMap;
use warden_shared::{AuditEvent, StatSnapshot};

const ANONYMOUS: &str = "<anonymous>";

fn consumer_label(consumer: &str) -> &str {
    if consumer.is_empty() {
        ANONYMOUS
    } else {
        consumer
    }
}

/// One line per audit event: `[ts] consumer method host`.
pub fn format_event(event: &AuditEvent) -> String {
    let host = if event.host.is_empty() { "-" } else { event.host.as_str() };
    format!(
        "[{}] {} {} {}",
        event.timestamp,
        consumer_label(&event.consumer).cyan(),
        event.method.bold(),
        host.dimmed()
    )
}

fn sorted(counts: &HashMap<String, u64>) -> Vec<(&str, u64)> {
    let mut rows: Vec<_> = counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    rows
}

/// Multi-line block per snapshot, busiest entries first.
pub fn format_snapshot(snapshot: &StatSnapshot) -> String {
    let counters = &snapshot.counters;
    let mut out = format!(
        "[{}] {} call(s)",
        snapshot.timestamp,
        counters.total_calls().to_string().green()
    );
    for (method, n) in sorted(&counters.by_method) {
        out.push_str(&format!("\n  method   {:>8}  {}", n, method));
    }
    for (consumer, n) in sorted(&counters.by_consumer) {
        out.push_str(&format!("\n  consumer {:>8}  {}", n, consumer_label(consumer)));
    }
    out
}
