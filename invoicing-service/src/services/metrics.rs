//! Metrics collection and Prometheus export.
//!
//! Installs the global recorder and provides the text rendered by `/metrics`.
//! Recording before `init_metrics` is a no-op, so tests never need a recorder.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Later calls return without touching the
/// recorder that is already installed.
pub fn init_metrics() -> anyhow::Result<()> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;

    // Lost race: another caller installed first, keep theirs.
    let _ = METRICS_HANDLE.set(handle);
    Ok(())
}

/// Get the current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized".to_string())
}

/// One PDF export attempt, labelled by outcome (`success`, `asset_error`, ...).
pub fn record_export(outcome: &'static str, seconds: f64) {
    counter!("invoicing_exports_total", "outcome" => outcome).increment(1);
    histogram!("invoicing_export_duration_seconds", "outcome" => outcome).record(seconds);
}

/// Invoice mutations by kind: create, update, delete, item_add, ...
pub fn record_invoice_operation(operation: &'static str) {
    counter!("invoicing_invoices_total", "operation" => operation).increment(1);
}

pub fn record_db_query(operation: &'static str, seconds: f64) {
    histogram!("invoicing_db_query_duration_seconds", "operation" => operation).record(seconds);
}

pub fn record_auth_event(event: &'static str) {
    counter!("invoicing_auth_events_total", "event" => event).increment(1);
}
