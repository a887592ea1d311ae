//! Prometheus metrics for approval-portal.

use once_cell::sync::Lazy;
use prometheus::{register_counter, register_counter_vec, Counter, CounterVec};

/// Workflow transitions by action (submit, advance, reject, request_revision).
pub static WORKFLOW_TRANSITIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "approval_workflow_transitions_total",
        "Total number of approval workflow transitions",
        &["action", "to_status"]
    )
    .expect("Failed to register workflow_transitions_total")
});

/// Transitions refused by the state machine.
pub static WORKFLOW_REJECTED_TRANSITIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "approval_workflow_refused_total",
        "Total number of workflow operations refused",
        &["action", "reason"] // invalid_transition, validation, forbidden
    )
    .expect("Failed to register workflow_refused_total")
});

/// Persisted master-data values surfaced as historical options.
pub static HISTORICAL_VALUES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "approval_historical_values_total",
        "Total number of persisted values shown as historical options",
        &["field"] // category, account_name
    )
    .expect("Failed to register historical_values_total")
});

/// Master-data lookups by field and outcome.
pub static MASTER_DATA_LOOKUPS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "approval_master_data_lookups_total",
        "Total number of master-data lookups",
        &["field", "outcome"] // cache_hit, fetched, failed, superseded
    )
    .expect("Failed to register master_data_lookups_total")
});

/// Transaction labels that fell back to the default hierarchy code.
pub static TRANSACTION_CODE_FALLBACKS_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "approval_transaction_code_fallbacks_total",
        "Total number of transaction types mapped to the fallback code"
    )
    .expect("Failed to register transaction_code_fallbacks_total")
});

/// Amounts clamped to the display ceiling.
pub static AMOUNTS_CLAMPED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "approval_amounts_clamped_total",
        "Total number of amounts clamped while formatting"
    )
    .expect("Failed to register amounts_clamped_total")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    portal_core::metrics::init_metrics();
    Lazy::force(&WORKFLOW_TRANSITIONS_TOTAL);
    Lazy::force(&WORKFLOW_REJECTED_TRANSITIONS_TOTAL);
    Lazy::force(&HISTORICAL_VALUES_TOTAL);
    Lazy::force(&MASTER_DATA_LOOKUPS_TOTAL);
    Lazy::force(&TRANSACTION_CODE_FALLBACKS_TOTAL);
    Lazy::force(&AMOUNTS_CLAMPED_TOTAL);
}

pub use portal_core::metrics::get_metrics;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposes_registered_metrics() {
        init_metrics();
        WORKFLOW_TRANSITIONS_TOTAL
            .with_label_values(&["submit", "Prepared"])
            .inc();
        let text = get_metrics();
        assert!(text.contains("approval_workflow_transitions_total"));
    }
}
