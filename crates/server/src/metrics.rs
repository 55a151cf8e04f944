//! Prometheus metrics
//!
//! The recorder is installed once by the binary; without it every
//! `record_*` call is a no-op.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::state::AppState;
use crate::ServerError;

pub const REQUESTS_TOTAL: &str = "claritas_requests_total";
pub const ERRORS_TOTAL: &str = "claritas_errors_total";
pub const FALLBACK_TOTAL: &str = "claritas_fallback_total";
pub const RETRIEVAL_LATENCY_MS: &str = "claritas_retrieval_latency_ms";
pub const GENERATION_LATENCY_MS: &str = "claritas_generation_latency_ms";
pub const REQUEST_LATENCY_MS: &str = "claritas_request_latency_ms";

/// Install the global Prometheus recorder
pub fn init_metrics() -> Result<PrometheusHandle, ServerError> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ServerError::Internal(format!("Failed to install metrics recorder: {}", e)))
}

pub fn record_request(endpoint: &'static str) {
    metrics::counter!(REQUESTS_TOTAL, "endpoint" => endpoint).increment(1);
}

pub fn record_error(kind: &'static str) {
    metrics::counter!(ERRORS_TOTAL, "kind" => kind).increment(1);
}

pub fn record_fallback() {
    metrics::counter!(FALLBACK_TOTAL).increment(1);
}

pub fn record_latency(name: &'static str, ms: f64) {
    metrics::histogram!(name).record(ms);
}

/// `GET /metrics`
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics {
        Some(ref handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed".to_string(),
        ),
    }
}
