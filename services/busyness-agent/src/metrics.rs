//! Prometheus metrics exposition
//!
//! The poller emits through the `metrics` facade; this module installs the
//! recorder and renders the exposition text:
//!
//! - `gym_poll_total` (counter): label `outcome`
//! - `gym_poll_duration_seconds` (histogram)
//! - `gym_current_capacity` / `gym_current_percentage` (gauges)
//! - `gym_trigger_fired_total` (counter): label `type`

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering metrics.
///
/// Configures `gym_poll_duration_seconds` with explicit buckets so it
/// renders as a Prometheus histogram (with `_bucket` lines for
/// `histogram_quantile()` queries) rather than the default summary. The
/// bucket range covers a fast cache hit up to the 10s request timeout plus
/// the re-login round trip.
pub fn install_recorder() -> PrometheusHandle {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            metrics_exporter_prometheus::Matcher::Full("gym_poll_duration_seconds".to_string()),
            &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 30.0],
        )
        .expect("failed to set histogram buckets")
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

/// Record a fired device trigger with its kind label.
pub fn record_trigger_fired(kind: &str) {
    metrics::counter!("gym_trigger_fired_total", "type" => kind.to_string()).increment(1);
}
