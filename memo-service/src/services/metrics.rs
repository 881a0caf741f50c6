//! Metrics collection and Prometheus export.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use service_core::error::AppError;
use std::sync::OnceLock;

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub const AI_FALLBACK_TOTAL: &str = "memo_ai_fallback_total";
pub const AI_REQUESTS_TOTAL: &str = "memo_ai_requests_total";
pub const DB_QUERY_DURATION: &str = "memo_db_query_duration_seconds";

/// Install the Prometheus recorder. Later calls are no-ops.
pub fn init_metrics() -> Result<(), AppError> {
    if METRICS_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))
    })?;

    let _ = METRICS_HANDLE.set(handle);
    Ok(())
}

/// Current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized".to_string())
}

/// Count a model-backed operation that was answered by the local fallback.
pub fn record_fallback(operation: &'static str, reason: &'static str) {
    metrics::counter!(AI_FALLBACK_TOTAL, "operation" => operation, "reason" => reason).increment(1);
}

/// Count a model-backed operation by outcome.
pub fn record_ai_request(operation: &'static str, outcome: &'static str) {
    metrics::counter!(AI_REQUESTS_TOTAL, "operation" => operation, "outcome" => outcome)
        .increment(1);
}

pub fn record_query_duration(query: &'static str, seconds: f64) {
    metrics::histogram!(DB_QUERY_DURATION, "query" => query).record(seconds);
}
