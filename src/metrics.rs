//! Prometheus metrics for gateway traffic and store latency.
//!
//! This module provides metrics for:
//! - Requests served per endpoint
//! - Store operation latency and failures
//! - Snapshot writes

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use tracing::info;

// === Metric Name Constants ===

/// Requests served counter metric name.
pub const METRIC_REQUESTS: &str = "gateway_requests_total";
/// Store operation latency metric name.
pub const METRIC_STORE_OP_LATENCY: &str = "store_op_latency_ms";
/// Store operation failures counter metric name.
pub const METRIC_STORE_FAILURES: &str = "store_failures_total";
/// Snapshot writes counter metric name.
pub const METRIC_SYNC_WRITES: &str = "sync_writes_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_counter!(METRIC_REQUESTS, "Total number of gateway requests by endpoint");
    describe_histogram!(
        METRIC_STORE_OP_LATENCY,
        "Key-value store operation latency in milliseconds"
    );
    describe_counter!(
        METRIC_STORE_FAILURES,
        "Total number of failed key-value store operations"
    );
    describe_counter!(METRIC_SYNC_WRITES, "Total number of snapshots written via sync");
}

/// Install the Prometheus exporter with its own scrape listener.
pub fn install_exporter(port: u16) -> Result<(), BuildError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    info!("Metrics listening on {}", addr);
    Ok(())
}

/// Increment the request counter for an endpoint.
pub fn inc_requests(endpoint: &'static str) {
    counter!(METRIC_REQUESTS, "endpoint" => endpoint).increment(1);
}

/// Record store operation latency.
pub fn record_store_latency(start: Instant, op: &'static str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_STORE_OP_LATENCY, "op" => op).record(latency_ms);
}

/// Increment store failures counter.
pub fn inc_store_failures(op: &'static str) {
    counter!(METRIC_STORE_FAILURES, "op" => op).increment(1);
}

/// Increment sync writes counter.
pub fn inc_sync_writes() {
    counter!(METRIC_SYNC_WRITES).increment(1);
}
