//! Gym busyness polling agent
//!
//! Single-binary service that:
//! 1. Logs into the gym-occupancy API with a session-cookie flow
//! 2. Polls the per-user busyness resource on a fixed interval
//! 3. Serves the latest snapshot, health, and diagnostics over HTTP
//! 4. Evaluates configured device triggers on each snapshot change

mod config;
mod metrics;
mod routes;
mod watcher;

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use gym_api::GymApiClient;
use gym_poller::{Coordinator, spawn_poll_task};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::routes::AppState;

/// How long in-flight requests get to finish after a shutdown signal.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting gym-busyness-agent");

    // Install the Prometheus recorder before any metrics are emitted
    let prometheus_handle = metrics::install_recorder();

    // CLI: simple --config flag parsing
    let args: Vec<String> = std::env::args().collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");

    let mut config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        listen_addr = %config.server.listen_addr,
        base_url = %config.api.base_url,
        poll_interval_secs = config.api.poll_interval_secs,
        triggers = config.triggers.len(),
        "configuration loaded"
    );

    // Redacted config echo for the diagnostics endpoint — the password
    // field is never serialized
    let config_echo =
        serde_json::to_value(&config).context("failed to serialize config echo")?;

    let password = config
        .api
        .password
        .take()
        .context("password missing after config load")?;
    let http = gym_api::build_http_client(config.timeout())
        .context("failed to build HTTP client")?;
    let client = GymApiClient::with_base_url(
        config.api.username.clone(),
        password,
        http,
        config.api.base_url.clone(),
    );

    let coordinator = Arc::new(Coordinator::new(client, config.poll_interval()));

    // Eager startup refresh: without one good snapshot there is nothing to
    // serve, so either failure kind aborts setup here
    info!("running startup refresh");
    let snapshot = coordinator
        .first_refresh()
        .await
        .context("startup refresh failed")?;
    info!(
        location = %snapshot.gym_location_name,
        capacity = snapshot.current_capacity,
        status = %snapshot.status,
        "startup refresh complete"
    );

    let rules = Arc::new(config.triggers.clone());
    let poll_handle = spawn_poll_task(coordinator.clone());
    let watcher_handle = watcher::spawn_trigger_watcher(coordinator.subscribe(), rules.clone());

    let state = AppState {
        coordinator,
        prometheus: prometheus_handle,
        config_echo: Arc::new(config_echo),
        rules,
        started_at: Instant::now(),
    };
    let app = routes::build_router(state, config.server.max_connections);

    let listener = TcpListener::bind(config.server.listen_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.server.listen_addr))?;
    info!(addr = %config.server.listen_addr, "accepting requests");

    // Graceful shutdown: stop accepting on SIGTERM/SIGINT, then give
    // in-flight requests DRAIN_TIMEOUT to finish
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    shutdown_signal().await;
    info!("shutdown signal received, draining");
    let _ = shutdown_tx.send(());

    match tokio::time::timeout(DRAIN_TIMEOUT, server_handle).await {
        Ok(Ok(Ok(()))) => info!("all in-flight requests drained"),
        Ok(Ok(Err(e))) => error!(error = %e, "server error during shutdown"),
        Ok(Err(e)) => error!(error = %e, "server task panicked"),
        Err(_) => warn!(
            drain_timeout_secs = DRAIN_TIMEOUT.as_secs(),
            "drain timeout exceeded, forcing shutdown"
        ),
    }

    poll_handle.abort();
    watcher_handle.abort();

    info!("shutdown complete");
    Ok(())
}

/// Wait for SIGTERM or SIGINT for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
