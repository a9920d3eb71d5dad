//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, cache result
//! - `proxy_request_duration_seconds` (histogram): end-to-end latency
//! - `proxy_cache_lookups_total` (counter): lookups by result (hit/miss)
//! - `proxy_cache_stores_total` (counter): store attempts by result
//! - `proxy_upstream_errors_total` (counter): forward failures by kind
//!
//! Recording is a no-op until `init_metrics` installs the Prometheus exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::http::response::CacheStatus;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!("proxy_requests_total", "Total requests handled by the proxy");
    describe_histogram!("proxy_request_duration_seconds", "End-to-end request latency in seconds");
    describe_counter!("proxy_cache_lookups_total", "Cache lookups by result");
    describe_counter!("proxy_cache_stores_total", "Cache store attempts by result");
    describe_counter!("proxy_upstream_errors_total", "Upstream forwarding failures by kind");

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record a completed request.
pub fn record_request(method: &str, status: u16, cache: CacheStatus, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("cache", cache.as_str().to_string()),
    ];
    counter!("proxy_requests_total", &labels).increment(1);
    histogram!("proxy_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

pub fn record_cache_lookup(result: CacheStatus) {
    counter!("proxy_cache_lookups_total", "result" => result.as_str()).increment(1);
}

pub fn record_cache_store(result: &'static str) {
    counter!("proxy_cache_stores_total", "result" => result).increment(1);
}

pub fn record_upstream_error(kind: &'static str) {
    counter!("proxy_upstream_errors_total", "kind" => kind).increment(1);
}
