//! Prometheus metrics for monitoring server health and traffic.
//!
//! Metrics are exposed in Prometheus text format by an exporter bound to
//! `METRICS_BIND` when configured. Without a recorder installed every
//! call here is a no-op, so tests and metric-less deployments pay
//! nothing.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Initialize the Prometheus metrics exporter
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|err| format!("Failed to install Prometheus exporter: {}", err))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record an HTTP request with method, path, and status labels
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Account Metrics
// ============================================================================

/// Count a completed registration
pub fn registrations_total() {
    metrics::counter!("registrations_total").increment(1);
}

/// Count a login attempt by outcome
pub fn login_attempts_total(success: bool) {
    metrics::counter!("login_attempts_total",
        "success" => success.to_string()
    )
    .increment(1);
}
