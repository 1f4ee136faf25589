//! Metrics collection and exposition.
//!
//! # Metrics
//! - `smock_requests_total` (counter): requests by method, status, action
//! - `smock_request_duration_seconds` (histogram): latency by method, action
//! - `smock_conflicts_total` (counter): rejected appends by route path
//! - `smock_document_writes_total` (counter): document rewrites by format

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, action: &str, start: Instant) {
    ::metrics::counter!(
        "smock_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "action" => action.to_string()
    )
    .increment(1);
    ::metrics::histogram!(
        "smock_request_duration_seconds",
        "method" => method.to_string(),
        "action" => action.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_conflict(path: &str) {
    ::metrics::counter!("smock_conflicts_total", "path" => path.to_string()).increment(1);
}

pub fn record_document_write(format: &'static str) {
    ::metrics::counter!("smock_document_writes_total", "format" => format).increment(1);
}
