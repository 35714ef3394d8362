//! Refresh scheduling, outcome mapping, and snapshot caching

use std::time::Duration;

use gym_api::{ApiError, BusynessSnapshot};
use tokio::sync::{Mutex, RwLock, watch};
use tracing::{debug, error, warn};

use crate::error::PollError;
use crate::source::BusynessSource;

/// Outcome of one refresh, in host vocabulary.
///
/// `AuthFailure` demands new credentials from the user; the coordinator
/// never retries it with the same ones. `TransientFailure` marks the data
/// stale while the last good snapshot keeps being served to readers.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Success(BusynessSnapshot),
    AuthFailure(String),
    TransientFailure(String),
}

impl RefreshOutcome {
    /// Outcome label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            RefreshOutcome::Success(_) => "success",
            RefreshOutcome::AuthFailure(_) => "auth_failure",
            RefreshOutcome::TransientFailure(_) => "transient_failure",
        }
    }
}

/// Availability of the coordinator's data, derived from the last outcome.
///
/// Transitions:
/// - Starting → Ok | Stale | AuthFailed (first refresh)
/// - Ok → Stale (transient failure) | AuthFailed (credentials rejected)
/// - Stale → Ok (next success) | AuthFailed
/// - AuthFailed → Ok (host re-authenticated and a refresh succeeded)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollerStatus {
    /// No refresh has completed yet
    Starting,
    /// Last refresh succeeded, snapshot is fresh
    Ok,
    /// Last refresh failed transiently, cached snapshot is stale
    Stale,
    /// Credentials were rejected, host must re-authenticate
    AuthFailed,
}

impl PollerStatus {
    /// Status label for health reporting and logging.
    pub fn label(&self) -> &'static str {
        match self {
            PollerStatus::Starting => "starting",
            PollerStatus::Ok => "ok",
            PollerStatus::Stale => "stale",
            PollerStatus::AuthFailed => "auth_failed",
        }
    }
}

/// Fixed-interval refresh state over a single busyness source.
///
/// Refreshes are serialized through the source mutex: one refresh,
/// including its possible re-login + retried fetch, completes before the
/// next may start, no matter how many host surfaces can trigger one. The
/// cached snapshot lives in a watch channel so readers get the current
/// value cheaply and subscribers get a push on every replacement.
pub struct Coordinator<S: BusynessSource> {
    source: Mutex<S>,
    current: watch::Sender<Option<BusynessSnapshot>>,
    status: RwLock<PollerStatus>,
    interval: Duration,
}

impl<S: BusynessSource> Coordinator<S> {
    /// Default poll cadence.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(300);

    pub fn new(source: S, interval: Duration) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            source: Mutex::new(source),
            current,
            status: RwLock::new(PollerStatus::Starting),
            interval,
        }
    }

    /// Poll cadence this coordinator was configured with.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one refresh and translate the result.
    ///
    /// On success the cached snapshot is replaced atomically and
    /// subscribers are notified. On failure the cache is left untouched.
    pub async fn refresh(&self) -> RefreshOutcome {
        let mut source = self.source.lock().await;
        let outcome = match source.fetch().await {
            Ok(snapshot) => {
                debug!(
                    location = %snapshot.gym_location_name,
                    capacity = snapshot.current_capacity,
                    status = %snapshot.status,
                    "refresh succeeded"
                );
                self.current.send_replace(Some(snapshot.clone()));
                RefreshOutcome::Success(snapshot)
            }
            Err(ApiError::InvalidAuth(reason)) => {
                error!(%reason, "refresh failed, credentials rejected");
                RefreshOutcome::AuthFailure(reason)
            }
            Err(ApiError::Transient(reason)) => {
                warn!(%reason, "refresh failed, keeping last snapshot");
                RefreshOutcome::TransientFailure(reason)
            }
        };

        let mut status = self.status.write().await;
        *status = match &outcome {
            RefreshOutcome::Success(_) => PollerStatus::Ok,
            RefreshOutcome::AuthFailure(_) => PollerStatus::AuthFailed,
            RefreshOutcome::TransientFailure(_) => PollerStatus::Stale,
        };
        outcome
    }

    /// Eager startup refresh. Either failure kind is a hard setup error —
    /// there is no stale snapshot yet to degrade to.
    pub async fn first_refresh(&self) -> Result<BusynessSnapshot, PollError> {
        match self.refresh().await {
            RefreshOutcome::Success(snapshot) => Ok(snapshot),
            RefreshOutcome::AuthFailure(reason) => Err(PollError::Auth(reason)),
            RefreshOutcome::TransientFailure(reason) => Err(PollError::Transient(reason)),
        }
    }

    /// Last-known snapshot, if any refresh has succeeded.
    pub fn snapshot(&self) -> Option<BusynessSnapshot> {
        self.current.borrow().clone()
    }

    /// Change notifications: receivers observe every snapshot replacement.
    pub fn subscribe(&self) -> watch::Receiver<Option<BusynessSnapshot>> {
        self.current.subscribe()
    }

    /// Current availability.
    pub async fn status(&self) -> PollerStatus {
        self.status.read().await.clone()
    }

    /// Health summary for the HTTP surface.
    ///
    /// healthy = fresh data, degraded = stale data still being served,
    /// unhealthy = nothing servable (never refreshed, or credentials
    /// rejected).
    pub async fn health(&self) -> serde_json::Value {
        let status = self.status().await;
        let snapshot = self.snapshot();
        let health = match (&status, &snapshot) {
            (PollerStatus::Ok, Some(_)) => "healthy",
            (PollerStatus::Stale, Some(_)) => "degraded",
            _ => "unhealthy",
        };
        serde_json::json!({
            "status": health,
            "poller": status.label(),
            "has_snapshot": snapshot.is_some(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::future::Future;
    use std::pin::Pin;

    /// Source that replays a fixed script of fetch results.
    struct ScriptedSource {
        results: VecDeque<Result<BusynessSnapshot, ApiError>>,
    }

    impl ScriptedSource {
        fn new(results: Vec<Result<BusynessSnapshot, ApiError>>) -> Self {
            Self {
                results: results.into(),
            }
        }
    }

    impl BusynessSource for ScriptedSource {
        fn fetch(
            &mut self,
        ) -> Pin<Box<dyn Future<Output = Result<BusynessSnapshot, ApiError>> + Send + '_>>
        {
            let next = self.results.pop_front().expect("fetch script exhausted");
            Box::pin(async move { next })
        }
    }

    fn snapshot(capacity: u32, status: &str) -> BusynessSnapshot {
        BusynessSnapshot {
            gym_location_id: "G1".into(),
            gym_location_name: "Test Gym".into(),
            current_capacity: capacity,
            current_percentage: f64::from(capacity),
            historical: serde_json::Value::Array(vec![]),
            status: status.into(),
        }
    }

    fn coordinator(
        script: Vec<Result<BusynessSnapshot, ApiError>>,
    ) -> Coordinator<ScriptedSource> {
        Coordinator::new(ScriptedSource::new(script), Duration::from_secs(300))
    }

    #[tokio::test]
    async fn success_caches_snapshot_and_notifies() {
        let coordinator = coordinator(vec![Ok(snapshot(50, "open"))]);
        let mut rx = coordinator.subscribe();

        let outcome = coordinator.refresh().await;
        assert_eq!(outcome, RefreshOutcome::Success(snapshot(50, "open")));
        assert_eq!(coordinator.snapshot(), Some(snapshot(50, "open")));
        assert_eq!(coordinator.status().await, PollerStatus::Ok);

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), Some(snapshot(50, "open")));
    }

    #[tokio::test]
    async fn observables_map_one_to_one() {
        let coordinator = coordinator(vec![Ok(snapshot(50, "open"))]);
        coordinator.refresh().await;

        let current = coordinator.snapshot().unwrap();
        assert_eq!(current.current_capacity, 50);
        assert_eq!(current.status, "open");
        assert_eq!(current.gym_location_id, "G1");
    }

    #[tokio::test]
    async fn first_refresh_auth_failure_is_hard_error() {
        let coordinator = coordinator(vec![Err(ApiError::InvalidAuth("rejected".into()))]);
        let err = coordinator.first_refresh().await.unwrap_err();
        assert!(matches!(err, PollError::Auth(_)), "got: {err}");
        assert_eq!(coordinator.snapshot(), None);

        let health = coordinator.health().await;
        assert_eq!(health["status"], "unhealthy");
    }

    #[tokio::test]
    async fn first_refresh_transient_is_hard_error() {
        let coordinator = coordinator(vec![Err(ApiError::Transient("timeout".into()))]);
        let err = coordinator.first_refresh().await.unwrap_err();
        assert!(matches!(err, PollError::Transient(_)), "got: {err}");
        assert_eq!(coordinator.snapshot(), None);
    }

    #[tokio::test]
    async fn transient_failure_retains_cached_snapshot() {
        let coordinator = coordinator(vec![
            Ok(snapshot(50, "open")),
            Err(ApiError::Transient("upstream 500".into())),
        ]);

        coordinator.first_refresh().await.unwrap();
        let outcome = coordinator.refresh().await;

        assert_eq!(
            outcome,
            RefreshOutcome::TransientFailure("upstream 500".into())
        );
        assert_eq!(coordinator.snapshot(), Some(snapshot(50, "open")));
        assert_eq!(coordinator.status().await, PollerStatus::Stale);

        let health = coordinator.health().await;
        assert_eq!(health["status"], "degraded");
    }

    #[tokio::test]
    async fn auth_failure_retains_cached_snapshot() {
        let coordinator = coordinator(vec![
            Ok(snapshot(50, "open")),
            Err(ApiError::InvalidAuth("password changed".into())),
        ]);

        coordinator.first_refresh().await.unwrap();
        let outcome = coordinator.refresh().await;

        assert_eq!(
            outcome,
            RefreshOutcome::AuthFailure("password changed".into())
        );
        assert_eq!(coordinator.snapshot(), Some(snapshot(50, "open")));
        assert_eq!(coordinator.status().await, PollerStatus::AuthFailed);

        let health = coordinator.health().await;
        assert_eq!(health["status"], "unhealthy");
    }

    #[tokio::test]
    async fn success_replaces_previous_snapshot() {
        let coordinator = coordinator(vec![
            Ok(snapshot(50, "open")),
            Ok(snapshot(12, "closed")),
        ]);

        coordinator.refresh().await;
        coordinator.refresh().await;

        assert_eq!(coordinator.snapshot(), Some(snapshot(12, "closed")));
    }

    #[tokio::test]
    async fn recovers_to_ok_after_stale() {
        let coordinator = coordinator(vec![
            Ok(snapshot(50, "open")),
            Err(ApiError::Transient("blip".into())),
            Ok(snapshot(55, "open")),
        ]);

        coordinator.refresh().await;
        coordinator.refresh().await;
        coordinator.refresh().await;

        assert_eq!(coordinator.status().await, PollerStatus::Ok);
        assert_eq!(coordinator.snapshot(), Some(snapshot(55, "open")));
    }

    #[tokio::test]
    async fn health_before_any_refresh_is_unhealthy() {
        let coordinator = coordinator(vec![]);
        assert_eq!(coordinator.status().await, PollerStatus::Starting);

        let health = coordinator.health().await;
        assert_eq!(health["status"], "unhealthy");
        assert_eq!(health["poller"], "starting");
        assert_eq!(health["has_snapshot"], false);
    }
}
