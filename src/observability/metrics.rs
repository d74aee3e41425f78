//! Metrics collection and exposition.
//!
//! # Metrics
//! - `polyfuse_decisions_total` (counter): decisions by fuse, outcome
//! - `polyfuse_trips_total` (counter): denials by fuse, reason
//! - `polyfuse_outcomes_total` (counter): reported outcomes by fuse, result
//! - `polyfuse_store_errors_total` (counter): store failures by fuse, op
//! - `polyfuse_request_level` / `polyfuse_error_level` (gauge): last
//!   persisted counters

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::resilience::types::{Snapshot, TripReason};

/// Install the Prometheus exporter with an HTTP scrape listener.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_decision(fuse: &str, allowed: bool) {
    let outcome = if allowed { "allow" } else { "deny" };
    counter!("polyfuse_decisions_total", "fuse" => fuse.to_string(), "outcome" => outcome).increment(1);
}

pub fn record_trip(fuse: &str, reason: TripReason) {
    counter!("polyfuse_trips_total", "fuse" => fuse.to_string(), "reason" => reason.as_str()).increment(1);
}

pub fn record_outcome(fuse: &str, success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!("polyfuse_outcomes_total", "fuse" => fuse.to_string(), "result" => result).increment(1);
}

pub fn record_store_error(fuse: &str, op: &'static str) {
    counter!("polyfuse_store_errors_total", "fuse" => fuse.to_string(), "op" => op).increment(1);
}

pub fn record_levels(fuse: &str, snapshot: &Snapshot) {
    gauge!("polyfuse_request_level", "fuse" => fuse.to_string()).set(snapshot.request_count);
    gauge!("polyfuse_error_level", "fuse" => fuse.to_string()).set(snapshot.error_count);
}
