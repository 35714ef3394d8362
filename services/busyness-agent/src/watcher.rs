//! Trigger evaluation on snapshot changes
//!
//! Subscribes to the coordinator's change notifications and evaluates the
//! configured trigger rules against each snapshot replacement. A fired
//! trigger is logged and counted; acting on it is the business of whatever
//! automation consumes the logs and metrics.

use std::sync::Arc;

use gym_api::BusynessSnapshot;
use gym_triggers::TriggerRule;
use tokio::sync::watch;
use tracing::info;

/// Spawn the watcher task. It ends when the coordinator (the watch sender)
/// goes away.
pub fn spawn_trigger_watcher(
    mut rx: watch::Receiver<Option<BusynessSnapshot>>,
    rules: Arc<Vec<TriggerRule>>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        // The value present at subscription time is the baseline, not a change
        let mut previous = rx.borrow_and_update().clone();
        while rx.changed().await.is_ok() {
            let current = rx.borrow_and_update().clone();
            if let Some(snapshot) = &current {
                for kind in gym_triggers::evaluate(&rules, previous.as_ref(), snapshot) {
                    info!(
                        trigger = kind.as_str(),
                        capacity = snapshot.current_capacity,
                        status = %snapshot.status,
                        "device trigger fired"
                    );
                    crate::metrics::record_trigger_fired(kind.as_str());
                }
            }
            previous = current;
        }
    })
}
