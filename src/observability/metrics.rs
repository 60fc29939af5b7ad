//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, dispatch
//! - `gateway_request_duration_seconds` (histogram): latency by method, dispatch
//!
//! Without an installed recorder the macros are no-ops, so recording is
//! always safe to call.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one finished request.
pub fn record_request(method: &str, status: u16, dispatch: &'static str, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "dispatch" => dispatch,
    )
    .increment(1);

    metrics::histogram!(
        "gateway_request_duration_seconds",
        "method" => method.to_string(),
        "dispatch" => dispatch,
    )
    .record(start.elapsed().as_secs_f64());
}
