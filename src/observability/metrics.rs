//! Metrics collection and exposition.
//!
//! # Metrics
//! - `settlement_validations_total` (counter): validations by chain, outcome
//! - `settlement_transfers_total` (counter): sweeps/payouts by chain, kind, status
//! - `settlement_rpc_health` (gauge): 1=healthy, 0=unhealthy, by chain
//!
//! Recording without an installed recorder is a no-op.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Count one validation outcome (`success` or a failure label).
pub fn record_validation(chain: &str, outcome: &'static str) {
    counter!(
        "settlement_validations_total",
        "chain" => chain.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Count one outgoing transfer.
pub fn record_transfer(chain: &str, kind: &'static str, status: &'static str) {
    counter!(
        "settlement_transfers_total",
        "chain" => chain.to_string(),
        "kind" => kind,
        "status" => status
    )
    .increment(1);
}

pub fn record_rpc_health(chain: &str, healthy: bool) {
    gauge!("settlement_rpc_health", "chain" => chain.to_string()).set(if healthy { 1.0 } else { 0.0 });
}
