// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Everything goes through the metrics-rs facade, so recording is a no-op
//! until a recorder is installed.

use metrics::{describe_counter, describe_gauge};

/// Register all sitekit metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "sitekit_leads_total",
        "Lead submissions by the method that recorded them"
    );
    describe_counter!(
        "sitekit_channel_failures_total",
        "Failed delivery attempts per channel"
    );
    describe_counter!(
        "sitekit_worker_fetch_total",
        "Requests answered by the cache worker, by resource class and source"
    );
    describe_gauge!("sitekit_lead_log_size", "Entries in the local lead log");
    describe_gauge!("sitekit_memory_heap_bytes", "Heap bytes allocated (jemalloc)");
    describe_gauge!("sitekit_memory_resident_bytes", "Resident bytes (jemalloc)");
}

/// Record a finished submission (`method` is a channel name or `local`).
pub fn record_lead(method: &str) {
    metrics::counter!("sitekit_leads_total", "method" => method.to_string()).increment(1);
}

/// Record a failed or timed-out channel attempt.
pub fn record_channel_failure(channel: &str) {
    metrics::counter!("sitekit_channel_failures_total", "channel" => channel.to_string())
        .increment(1);
}

/// Record how the worker answered a request (`source`: network, cache, offline).
pub fn record_worker_fetch(class: &str, source: &str) {
    metrics::counter!(
        "sitekit_worker_fetch_total",
        "class" => class.to_string(),
        "source" => source.to_string()
    )
    .increment(1);
}

pub fn set_lead_log_size(entries: usize) {
    metrics::gauge!("sitekit_lead_log_size").set(entries as f64);
}

pub fn set_memory_heap(bytes: f64) {
    metrics::gauge!("sitekit_memory_heap_bytes").set(bytes);
}

pub fn set_memory_resident(bytes: f64) {
    metrics::gauge!("sitekit_memory_resident_bytes").set(bytes);
}
