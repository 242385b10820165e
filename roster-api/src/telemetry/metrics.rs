//! Prometheus Metrics Definitions
//!
//! Defines all Roster metrics with appropriate labels and types.
//! Exposes a /metrics endpoint for Prometheus scraping.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_counter, CounterVec, Encoder,
    HistogramVec, IntCounter, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
/// Covers: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Upload processing buckets (seconds). Spreadsheet parsing dominates.
const UPLOAD_LATENCY_BUCKETS: &[f64] = &[
    0.010, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0, 30.0,
];

/// Global metrics instance - initialized once at startup
pub static METRICS: Lazy<ApiResult<RosterMetrics>> = Lazy::new(RosterMetrics::new);

/// Run `f` against the global metrics if they registered successfully.
pub fn record(f: impl FnOnce(&RosterMetrics)) {
    if let Ok(metrics) = METRICS.as_ref() {
        f(metrics);
    }
}

fn registration_error(name: &str, e: prometheus::Error) -> ApiError {
    ApiError::internal_error(format!("Failed to register {}: {}", name, e))
}

/// Container for all Roster metrics.
#[derive(Clone)]
pub struct RosterMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Upload counter - labels: outcome (completed, failed, rejected)
    pub uploads_total: CounterVec,

    /// Upload processing duration - labels: format
    pub upload_duration_seconds: HistogramVec,

    /// Rows assigned to agents across all uploads
    pub rows_distributed_total: IntCounter,

    /// Task status changes - labels: status
    pub task_transitions_total: CounterVec,

    /// Lists removed through cascading deletion
    pub lists_deleted_total: IntCounter,
}

impl RosterMetrics {
    /// Create and register all metrics with Prometheus.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "roster_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| registration_error("http_requests_total", e))?,

            http_request_duration_seconds: register_histogram_vec!(
                "roster_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_error("http_request_duration_seconds", e))?,

            uploads_total: register_counter_vec!(
                "roster_uploads_total",
                "Total uploads by outcome",
                &["outcome"]
            )
            .map_err(|e| registration_error("uploads_total", e))?,

            upload_duration_seconds: register_histogram_vec!(
                "roster_upload_duration_seconds",
                "Upload parse, distribute and commit duration in seconds",
                &["format"],
                UPLOAD_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_error("upload_duration_seconds", e))?,

            rows_distributed_total: register_int_counter!(
                "roster_rows_distributed_total",
                "Total rows assigned to agents"
            )
            .map_err(|e| registration_error("rows_distributed_total", e))?,

            task_transitions_total: register_counter_vec!(
                "roster_task_transitions_total",
                "Total task status changes by target status",
                &["status"]
            )
            .map_err(|e| registration_error("task_transitions_total", e))?,

            lists_deleted_total: register_int_counter!(
                "roster_lists_deleted_total",
                "Total lists deleted"
            )
            .map_err(|e| registration_error("lists_deleted_total", e))?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    /// Record the end of an upload attempt.
    pub fn record_upload(&self, outcome: &str, format: &str, rows: usize, duration_secs: f64) {
        self.uploads_total.with_label_values(&[outcome]).inc();
        self.upload_duration_seconds
            .with_label_values(&[format])
            .observe(duration_secs);
        if outcome == "completed" {
            self.rows_distributed_total.inc_by(rows as u64);
        }
    }

    pub fn record_task_transition(&self, status: &str) {
        self.task_transitions_total.with_label_values(&[status]).inc();
    }

    pub fn record_list_deleted(&self) {
        self.lists_deleted_total.inc();
    }
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Observability",
    responses(
        (
            status = 200,
            description = "Prometheus metrics in text format",
            content_type = "text/plain"
        ),
        (status = 500, description = "Failed to encode metrics"),
    ),
)]
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}
