//! Prometheus metrics for the configuration service.
//!
//! - Lifecycle transitions (initialize, edit, publish, discard, uninitialize)
//! - Section edits
//! - Template library and catalog operations
//! - Document store latency, errors, and version conflicts
//! - Active configuration subscriptions

mod helpers;

pub use helpers::{encode_metrics, LifecycleMetrics, StoreMetrics, TemplateMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, HistogramVec,
    IntCounterVec, IntGauge,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "atlas";

lazy_static! {
    // ============================================================================
    // Lifecycle Metrics
    // ============================================================================

    /// Successful lifecycle transitions by operation
    pub static ref LIFECYCLE_TRANSITIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_lifecycle_transitions_total", METRIC_PREFIX),
        "Successful configuration lifecycle transitions",
        &["op"]
    ).unwrap();

    /// Rejected lifecycle operations by operation and error code
    pub static ref LIFECYCLE_REJECTIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_lifecycle_rejections_total", METRIC_PREFIX),
        "Configuration lifecycle operations rejected",
        &["op", "code"]
    ).unwrap();

    /// Draft edits by configuration section
    pub static ref SECTION_EDITS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_section_edits_total", METRIC_PREFIX),
        "Draft edits by configuration section",
        &["section"]
    ).unwrap();

    // ============================================================================
    // Template Metrics
    // ============================================================================

    /// Template operations by scope (tenant/global), kind and operation
    pub static ref TEMPLATE_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_template_operations_total", METRIC_PREFIX),
        "Template library and catalog operations",
        &["scope", "kind", "op"]
    ).unwrap();

    // ============================================================================
    // Store Metrics
    // ============================================================================

    /// Document store operation latency
    pub static ref STORE_OPERATION_LATENCY: HistogramVec = register_histogram_vec!(
        format!("{}_store_operation_latency_seconds", METRIC_PREFIX),
        "Document store operation latency in seconds",
        &["backend", "op"],
        vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]
    ).unwrap();

    /// Document store errors
    pub static ref STORE_ERRORS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_store_errors_total", METRIC_PREFIX),
        "Document store operation errors",
        &["backend", "op"]
    ).unwrap();

    /// Writes rejected because the expected version was stale
    pub static ref STORE_CONFLICTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_store_conflicts_total", METRIC_PREFIX),
        "Document writes rejected by version check",
        &["backend"]
    ).unwrap();

    /// Open configuration subscriptions
    pub static ref SUBSCRIPTIONS_ACTIVE: IntGauge = register_int_gauge!(
        format!("{}_subscriptions_active", METRIC_PREFIX),
        "Open configuration subscriptions"
    ).unwrap();
}
