//! Prometheus metrics for the tournament server.
//!
//! Recording is always safe; values are only exported once
//! [`init_metrics`] has installed the Prometheus recorder.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use ct_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::http_requests_total("POST", 201);
//! metrics::rounds_created_total();
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Increment the HTTP request counter.
///
/// Labelled by method and status only; paths carry ids.
pub fn http_requests_total(method: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Tournament Metrics
// ============================================================================

/// Increment registration attempts, labelled `created` or the rejecting error kind.
pub fn registrations_total(outcome: &str) {
    metrics::counter!("registrations_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Increment payment verifications, labelled `valid`, `rejected`, `timeout` or `unavailable`.
pub fn payment_verifications_total(outcome: &str) {
    metrics::counter!("payment_verifications_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Increment rounds created.
pub fn rounds_created_total() {
    metrics::counter!("rounds_created_total").increment(1);
}

/// Record how long creating a round took, pairing included.
pub fn pairing_duration_ms(duration_ms: f64) {
    metrics::histogram!("pairing_duration_ms").record(duration_ms);
}

/// Increment recorded results, labelled by outcome.
pub fn results_recorded_total(outcome: &str) {
    metrics::counter!("results_recorded_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}
