//! Metrics collection and exposition.
//!
//! # Metrics
//! - `image_proxy_requests_total` (counter): requests by source and status
//! - `image_proxy_request_duration_seconds` (histogram): time to response headers
//! - `image_proxy_fallbacks_total` (counter): gateway escalations by reason
//! - `image_proxy_stream_errors_total` (counter): body copies cut short
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished request. `source` is `primary`, `fallback` or `rejected`.
pub fn record_request(source: &'static str, status: u16, start: Instant) {
    metrics::counter!(
        "image_proxy_requests_total",
        "source" => source,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("image_proxy_request_duration_seconds", "source" => source)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_fallback(reason: &'static str) {
    metrics::counter!("image_proxy_fallbacks_total", "reason" => reason).increment(1);
}

pub fn record_stream_error(source: &'static str) {
    metrics::counter!("image_proxy_stream_errors_total", "source" => source).increment(1);
}
