//! Client-side metrics.
//!
//! All metrics follow Prometheus naming conventions:
//! - `reserva_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! Nothing is exported unless the embedding binary installs a recorder.
//!
//! # Cardinality
//!
//! - `method`: HTTP verbs used by the client (5 values)
//! - `status`: success, client_error, server_error, transport
//! - `trigger`: proactive, reactive, explicit
//! - `outcome`: success, rejected, superseded, error

use metrics::{counter, histogram};
use std::time::Duration;

/// Record an API request.
///
/// Metric: `reserva_http_requests_total`, `reserva_http_request_duration_seconds`
/// Labels: `method`, `status`
pub fn record_http_request(method: &str, status_code: Option<u16>, duration: Duration) {
    let status = categorize_status(status_code);

    histogram!("reserva_http_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("reserva_http_requests_total",
        "method" => method.to_string(),
        "status" => status
    )
    .increment(1);
}

/// Record a completed refresh round-trip.
///
/// Metric: `reserva_session_refresh_total`, `reserva_session_refresh_duration_seconds`
/// Labels: `trigger`, `outcome`
pub fn record_refresh(trigger: &'static str, outcome: &'static str, duration: Duration) {
    histogram!("reserva_session_refresh_duration_seconds",
        "trigger" => trigger
    )
    .record(duration.as_secs_f64());

    counter!("reserva_session_refresh_total",
        "trigger" => trigger,
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a caller that piggybacked on an in-flight refresh.
///
/// Metric: `reserva_session_refresh_joined_total`
/// Labels: `trigger`
pub fn record_refresh_joined(trigger: &'static str) {
    counter!("reserva_session_refresh_joined_total", "trigger" => trigger).increment(1);
}

fn categorize_status(status_code: Option<u16>) -> &'static str {
    match status_code {
        Some(200..=399) => "success",
        Some(400..=499) => "client_error",
        Some(_) => "server_error",
        None => "transport",
    }
}
