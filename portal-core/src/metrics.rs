//! Prometheus metrics for the portal HTTP layer.

use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, CounterVec, TextEncoder};

/// Dispatch attempts by outcome (success, http_error, transport_error).
pub static DISPATCH_ATTEMPTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "portal_dispatch_attempts_total",
        "Total number of candidate attempts made by the dispatcher",
        &["outcome"]
    )
    .expect("Failed to register dispatch_attempts_total")
});

/// Dispatches that only succeeded after at least one candidate failed.
pub static DISPATCH_FAILOVERS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "portal_dispatch_failovers_total",
        "Total number of requests served by a non-primary candidate",
        &["method"]
    )
    .expect("Failed to register dispatch_failovers_total")
});

/// Dispatches where every candidate failed.
pub static DISPATCH_EXHAUSTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "portal_dispatch_exhausted_total",
        "Total number of requests for which every candidate failed",
        &["method"]
    )
    .expect("Failed to register dispatch_exhausted_total")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&DISPATCH_ATTEMPTS_TOTAL);
    Lazy::force(&DISPATCH_FAILOVERS_TOTAL);
    Lazy::force(&DISPATCH_EXHAUSTED_TOTAL);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
