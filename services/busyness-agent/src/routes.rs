//! HTTP surface for the host
//!
//! Read-only observables plus a host-callable refresh trigger:
//! - GET  /health       — availability of the poller's data
//! - GET  /metrics      — Prometheus text exposition
//! - GET  /snapshot     — last-known busyness snapshot
//! - POST /refresh      — run one refresh now, return the outcome
//! - GET  /diagnostics  — config echo (password redacted) + cached snapshot
//! - GET  /triggers     — available trigger kinds + configured rules

use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;

use gym_poller::{BusynessSource, Coordinator, RefreshOutcome};
use gym_triggers::TriggerRule;

/// Shared application state accessible from all handlers
pub struct AppState<S: BusynessSource> {
    pub coordinator: Arc<Coordinator<S>>,
    pub prometheus: PrometheusHandle,
    /// Redacted config echo, precomputed at startup
    pub config_echo: Arc<serde_json::Value>,
    pub rules: Arc<Vec<TriggerRule>>,
    pub started_at: Instant,
}

impl<S: BusynessSource> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            coordinator: self.coordinator.clone(),
            prometheus: self.prometheus.clone(),
            config_echo: self.config_echo.clone(),
            rules: self.rules.clone(),
            started_at: self.started_at,
        }
    }
}

/// Build the axum router with all routes and shared state.
///
/// The concurrency limit layer bounds the host-facing surface; the poller
/// itself never runs more than one refresh at a time regardless.
pub fn build_router<S>(state: AppState<S>, max_connections: usize) -> Router
where
    S: BusynessSource + 'static,
{
    Router::new()
        .route("/health", get(health_handler::<S>))
        .route("/metrics", get(metrics_handler::<S>))
        .route("/snapshot", get(snapshot_handler::<S>))
        .route("/refresh", post(refresh_handler::<S>))
        .route("/diagnostics", get(diagnostics_handler::<S>))
        .route("/triggers", get(triggers_handler::<S>))
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_connections))
        .with_state(state)
}

/// GET /health — 200 while data is servable (fresh or stale), 503 otherwise.
async fn health_handler<S: BusynessSource + 'static>(
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    let mut health = state.coordinator.health().await;
    let status_code = if health["status"] == "unhealthy" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    if let Some(body) = health.as_object_mut() {
        body.insert(
            "uptime_seconds".into(),
            state.started_at.elapsed().as_secs().into(),
        );
    }
    (status_code, Json(health))
}

/// GET /metrics — Prometheus text exposition format.
async fn metrics_handler<S: BusynessSource + 'static>(
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.prometheus.render(),
    )
}

/// GET /snapshot — the last-known busyness snapshot.
async fn snapshot_handler<S: BusynessSource + 'static>(
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    match state.coordinator.snapshot() {
        Some(snapshot) => (StatusCode::OK, Json(serde_json::json!(snapshot))),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"error": "no snapshot available yet"})),
        ),
    }
}

/// POST /refresh — run one refresh immediately and report the outcome.
///
/// An auth failure maps to 401 (the host must supply new credentials), a
/// transient failure to 502 (retry later, cached data stays available).
async fn refresh_handler<S: BusynessSource + 'static>(
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    match state.coordinator.refresh().await {
        RefreshOutcome::Success(snapshot) => (
            StatusCode::OK,
            Json(serde_json::json!({"outcome": "success", "snapshot": snapshot})),
        ),
        RefreshOutcome::AuthFailure(reason) => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"outcome": "auth_failure", "reason": reason})),
        ),
        RefreshOutcome::TransientFailure(reason) => (
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({"outcome": "transient_failure", "reason": reason})),
        ),
    }
}

/// GET /diagnostics — entry configuration with secrets redacted, plus the
/// cached snapshot.
async fn diagnostics_handler<S: BusynessSource + 'static>(
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    Json(serde_json::json!({
        "config": *state.config_echo,
        "snapshot": state.coordinator.snapshot(),
    }))
}

/// GET /triggers — the declarative trigger catalog and the configured rules.
async fn triggers_handler<S: BusynessSource + 'static>(
    State(state): State<AppState<S>>,
) -> impl IntoResponse {
    Json(serde_json::json!({
        "available": gym_triggers::available_triggers(),
        "configured": *state.rules,
    }))
}
