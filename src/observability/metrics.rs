//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_forwards_total` (counter): outbound attempts by method, status, upstream
//! - `gateway_forward_duration_seconds` (histogram): outbound latency distribution
//! - `gateway_upstream_unreachable_total` (counter): attempts with no response
//! - `gateway_failover_total` (counter): failover outcome by service type
//! - `gateway_target_health` (gauge): 1=healthy, 0=unhealthy per probed target
//!
//! # Design Decisions
//! - Exposed Prometheus-style on a dedicated listener, separate from proxy traffic
//! - Label values are low-cardinality: method, status, base URL, service type
//! - Recording is fire-and-forget; metric failures never affect requests

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener.
///
/// Failure to install is logged and ignored; the gateway runs without
/// exposition rather than refusing to start.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "failed to install metrics exporter"),
    }
}

/// Record one outbound attempt that produced a response.
pub fn record_forward(method: &str, status: u16, upstream: &str, start_time: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    let upstream = upstream.to_string();

    metrics::counter!(
        "gateway_forwards_total",
        "method" => method.clone(),
        "status" => status.clone(),
        "upstream" => upstream.clone()
    )
    .increment(1);
    metrics::histogram!(
        "gateway_forward_duration_seconds",
        "method" => method,
        "status" => status,
        "upstream" => upstream
    )
    .record(start_time.elapsed().as_secs_f64());
}

/// Record one outbound attempt that produced no response.
pub fn record_unreachable(upstream: &str) {
    metrics::counter!(
        "gateway_upstream_unreachable_total",
        "upstream" => upstream.to_string()
    )
    .increment(1);
}

/// Record how a failover-wrapped request resolved.
///
/// `outcome` is `primary`, `fallback`, or `unavailable`.
pub fn record_failover(service_type: &str, outcome: &'static str) {
    metrics::counter!(
        "gateway_failover_total",
        "service_type" => service_type.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record the latest probe result for a target.
pub fn record_probe(target: &str, healthy: bool) {
    metrics::gauge!(
        "gateway_target_health",
        "target" => target.to_string()
    )
    .set(if healthy { 1.0 } else { 0.0 });
}
