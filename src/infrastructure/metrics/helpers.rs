//! Metrics helper structs for convenient metric recording

use std::time::Duration;

use prometheus::{Encoder, TextEncoder};

use super::{
    LIFECYCLE_REJECTIONS_TOTAL, LIFECYCLE_TRANSITIONS_TOTAL, SECTION_EDITS_TOTAL,
    STORE_CONFLICTS_TOTAL, STORE_ERRORS_TOTAL, STORE_OPERATION_LATENCY, SUBSCRIPTIONS_ACTIVE,
    TEMPLATE_OPERATIONS_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording lifecycle metrics
pub struct LifecycleMetrics;

impl LifecycleMetrics {
    pub fn record_transition(op: &str) {
        LIFECYCLE_TRANSITIONS_TOTAL.with_label_values(&[op]).inc();
    }

    pub fn record_rejection(op: &str, code: &str) {
        LIFECYCLE_REJECTIONS_TOTAL
            .with_label_values(&[op, code])
            .inc();
    }

    pub fn record_section_edit(section: &str) {
        SECTION_EDITS_TOTAL.with_label_values(&[section]).inc();
    }

    pub fn subscription_opened() {
        SUBSCRIPTIONS_ACTIVE.inc();
    }

    pub fn subscription_closed() {
        SUBSCRIPTIONS_ACTIVE.dec();
    }
}

/// Helper struct for template metrics
pub struct TemplateMetrics;

impl TemplateMetrics {
    /// Record a tenant library operation
    pub fn record_tenant(kind: &str, op: &str) {
        TEMPLATE_OPERATIONS_TOTAL
            .with_label_values(&["tenant", kind, op])
            .inc();
    }

    /// Record a global catalog operation
    pub fn record_global(kind: &str, op: &str) {
        TEMPLATE_OPERATIONS_TOTAL
            .with_label_values(&["global", kind, op])
            .inc();
    }
}

/// Helper struct for document store metrics
pub struct StoreMetrics;

impl StoreMetrics {
    pub fn record_latency(backend: &str, op: &str, elapsed: Duration) {
        STORE_OPERATION_LATENCY
            .with_label_values(&[backend, op])
            .observe(elapsed.as_secs_f64());
    }

    pub fn record_error(backend: &str, op: &str) {
        STORE_ERRORS_TOTAL.with_label_values(&[backend, op]).inc();
    }

    pub fn record_conflict(backend: &str) {
        STORE_CONFLICTS_TOTAL.with_label_values(&[backend]).inc();
    }
}
