//! Prometheus metrics for monitoring the bridge.
//!
//! The library records match metrics through the `metrics` facade; this
//! module installs the exporter and records the HTTP side.
//!
//! # Metrics
//!
//! - `http_requests_total{method, route, status}`
//! - `http_request_duration_ms{method, route}`
//! - `matches_started_total`, `match_active`
//! - `rounds_played_total`
//! - `actions_accepted_total`, `actions_rejected_total{reason}`
//! - `decisions_timed_out_total`
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use pb_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//! metrics::http_requests_total("POST", "/action", 200);
//! ```

use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Sets up a Prometheus scrape endpoint on the specified address.
/// Metrics will be available at `http://<addr>/metrics`.
///
/// # Arguments
///
/// - `addr`: Address to bind the metrics server to (e.g., `0.0.0.0:9090`)
///
/// # Returns
///
/// Result indicating success or error message
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))?;
    describe();
    Ok(())
}

fn describe() {
    describe_counter!("http_requests_total", "HTTP requests served");
    describe_histogram!(
        "http_request_duration_ms",
        Unit::Milliseconds,
        "HTTP request latency"
    );
    describe_counter!("matches_started_total", "Matches started");
    describe_gauge!("match_active", "Engine threads currently running");
    describe_counter!("rounds_played_total", "Rounds played to completion");
    describe_counter!("actions_accepted_total", "Human actions delivered to the engine");
    describe_counter!("actions_rejected_total", "Human actions rejected, by reason");
    describe_counter!(
        "decisions_timed_out_total",
        "Human decisions that fell back to a fold"
    );
}

/// Count one answered request, labelled by route template.
pub fn http_requests_total(method: &str, route: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn http_request_duration_ms(method: &str, route: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(duration_ms);
}
