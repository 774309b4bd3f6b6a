//! Metrics collection and exposition.
//!
//! # Metrics
//! - `confbuilder_cycles_total` (counter): rebuild cycles by outcome
//!   (`unchanged`, `reloaded`, `failed`)
//! - `confbuilder_errors_total` (counter): sink errors by kind
//! - `confbuilder_reloads_total` (counter): reload invocations by result
//! - `confbuilder_registry_index` (gauge): last committed registry index

use std::net::SocketAddr;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

pub fn record_cycle(outcome: &'static str) {
    metrics::counter!("confbuilder_cycles_total", "outcome" => outcome).increment(1);
}

pub fn record_error(kind: &'static str) {
    metrics::counter!("confbuilder_errors_total", "kind" => kind).increment(1);
}

pub fn record_reload(success: bool) {
    let result = if success { "success" } else { "failure" };
    metrics::counter!("confbuilder_reloads_total", "result" => result).increment(1);
}

pub fn set_index(index: u64) {
    metrics::gauge!("confbuilder_registry_index").set(index as f64);
}
