//! Fixed-interval background polling

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::coordinator::{Coordinator, RefreshOutcome};
use crate::source::BusynessSource;

/// Spawn a background task that refreshes on the coordinator's interval.
///
/// Skips the immediate first tick — the eager startup refresh already ran.
/// Each cycle gets a correlation id so a login + retry sequence can be tied
/// to its poll in the logs.
///
/// Returns a `JoinHandle` for the spawned task.
pub fn spawn_poll_task<S>(coordinator: Arc<Coordinator<S>>) -> tokio::task::JoinHandle<()>
where
    S: BusynessSource + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(coordinator.interval());
        ticker.tick().await;

        loop {
            ticker.tick().await;
            poll_cycle(&coordinator).await;
        }
    })
}

/// Run one poll cycle: refresh, log the outcome, record metrics.
async fn poll_cycle<S: BusynessSource>(coordinator: &Coordinator<S>) {
    let refresh_id = Uuid::new_v4().as_simple().to_string();
    let started = Instant::now();
    let outcome = coordinator.refresh().await;
    let elapsed = started.elapsed().as_secs_f64();

    metrics::counter!("gym_poll_total", "outcome" => outcome.label().to_string()).increment(1);
    metrics::histogram!("gym_poll_duration_seconds").record(elapsed);

    match &outcome {
        RefreshOutcome::Success(snapshot) => {
            metrics::gauge!("gym_current_capacity").set(f64::from(snapshot.current_capacity));
            metrics::gauge!("gym_current_percentage").set(snapshot.current_percentage);
            debug!(
                refresh_id,
                capacity = snapshot.current_capacity,
                status = %snapshot.status,
                "poll cycle succeeded"
            );
        }
        RefreshOutcome::TransientFailure(reason) => {
            warn!(refresh_id, %reason, "poll cycle failed, serving stale data until next cycle");
        }
        RefreshOutcome::AuthFailure(reason) => {
            error!(refresh_id, %reason, "credentials rejected, re-authentication required");
        }
    }
}
