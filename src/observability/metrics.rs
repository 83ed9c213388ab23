//! Metrics for configuration resolution.
//!
//! # Metrics
//! - `config_load_total` (counter): load attempts by outcome
//! - `config_remote_fetch_total` (counter): remote fetches by provider, outcome
//! - `config_remote_fetch_duration_seconds` (histogram): remote fetch latency
//!
//! Recorded through the `metrics` facade; whichever recorder the service
//! installs receives them, and without one they are dropped.

use std::time::Duration;

/// Record the outcome of a full configuration load.
pub fn record_load(outcome: &'static str) {
    metrics::counter!("config_load_total", "outcome" => outcome).increment(1);
}

/// Record one remote fetch.
pub fn record_remote_fetch(provider: &'static str, outcome: &'static str, elapsed: Duration) {
    metrics::counter!(
        "config_remote_fetch_total",
        "provider" => provider,
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("config_remote_fetch_duration_seconds", "provider" => provider)
        .record(elapsed.as_secs_f64());
}
