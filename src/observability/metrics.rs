//! Metrics collection and exposition.
//!
//! # Metrics
//! - `service_connections_accepted_total` (counter): accepted connections
//! - `service_connections_active` (gauge): connections currently open
//! - `service_shutdown_phase_duration_seconds` (histogram): time per shutdown phase
//! - `service_shutdown_failures_total` (counter): failed phases, by phase
//!
//! # Design Decisions
//! - Without an installed recorder every call is a no-op
//! - The Prometheus exporter is opt-in via configuration

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the global Prometheus recorder with an HTTP scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn connection_opened() {
    counter!("service_connections_accepted_total").increment(1);
    gauge!("service_connections_active").increment(1.0);
}

pub fn connection_closed() {
    gauge!("service_connections_active").decrement(1.0);
}

/// Record how long a shutdown phase took and whether it succeeded.
pub fn record_shutdown_phase(phase: &'static str, succeeded: bool, started: Instant) {
    let outcome = if succeeded { "ok" } else { "error" };
    histogram!(
        "service_shutdown_phase_duration_seconds",
        "phase" => phase,
        "outcome" => outcome
    )
    .record(started.elapsed().as_secs_f64());

    if !succeeded {
        counter!("service_shutdown_failures_total", "phase" => phase).increment(1);
    }
}
