//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): requests by relay, method, status
//! - `relay_request_duration_seconds` (histogram): end-to-end latency
//! - `relay_redirects_total` (counter): redirect hops followed
//! - `relay_errors_total` (counter): failures by error kind
//!
//! # Design Decisions
//! - Exposition is opt-in (`observability.metrics_enabled`)
//! - Labels stay low-cardinality: no paths, no ids

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one finished relay request.
pub fn record_request(relay: &'static str, method: &str, status: u16, start: Instant) {
    let labels = [
        ("relay", relay.to_string()),
        ("method", method.to_string()),
        ("status", status.to_string()),
    ];
    counter!("relay_requests_total", &labels).increment(1);
    histogram!("relay_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

/// Record one redirect hop followed by the dispatcher.
pub fn record_redirect() {
    counter!("relay_redirects_total").increment(1);
}

/// Record a relay failure by [`RelayError::kind`](crate::relay::RelayError::kind).
pub fn record_error(kind: &'static str) {
    counter!("relay_errors_total", "kind" => kind).increment(1);
}
