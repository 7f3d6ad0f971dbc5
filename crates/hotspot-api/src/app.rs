//! Application builder and server lifecycle.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use hotspot_coa::CoaDispatcher;
use hotspot_core::config::AppConfig;
use hotspot_core::error::{AppError, ErrorKind};
use hotspot_core::result::AppResult;
use hotspot_session::SessionStore;

use crate::middleware::cors::build_cors_layer;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);
    build_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Runs the server until `shutdown` fires.
///
/// Rebuilds the registry from `store`, starts the background publishers and
/// the purge loop, then serves HTTP. On shutdown, open requests get
/// `server.shutdown_grace_seconds` to finish.
pub async fn run_server(
    config: AppConfig,
    store: Arc<dyn SessionStore>,
    shutdown: CancellationToken,
) -> AppResult<()> {
    info!("Starting hotspot session control server...");

    // ── Step 1: Wire components ──────────────────────────────────
    let dispatcher = CoaDispatcher::udp(config.coa.clone());
    let mut state = AppState::new(config, store, dispatcher);
    state.shutdown = shutdown.clone();
    let config = Arc::clone(&state.config);

    // ── Step 2: Rebuild the registry ─────────────────────────────
    if let Err(e) = state.maintenance.restore().await {
        warn!(error = %e, "Could not rebuild session registry; starting empty");
    }

    // ── Step 3: Background tasks ─────────────────────────────────
    let mut background = JoinSet::new();
    background.spawn(state.session_monitor.clone().run(
        Duration::from_secs(config.realtime.dashboard_interval_seconds.max(1)),
        shutdown.child_token(),
    ));
    background.spawn(state.router_monitor.clone().run(
        Duration::from_secs(config.realtime.router_health_interval_seconds.max(1)),
        shutdown.child_token(),
    ));
    background.spawn(state.maintenance.clone().run_purge(
        Duration::from_secs(config.termination.terminated_retention_seconds),
        Duration::from_secs(config.termination.purge_interval_seconds.max(1)),
        shutdown.child_token(),
    ));

    // ── Step 4: Serve ────────────────────────────────────────────
    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&address).await.map_err(|e| {
        AppError::with_source(ErrorKind::Configuration, format!("Cannot bind {address}"), e)
    })?;
    info!(address = %address, "HTTP server listening");

    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let server = axum::serve(listener, build_app(state))
        .with_graceful_shutdown(shutdown.clone().cancelled_owned());
    let result = server
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "HTTP server failed", e));

    // ── Step 5: Drain ────────────────────────────────────────────
    shutdown.cancel();
    let drained = tokio::time::timeout(grace, async {
        while background.join_next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        warn!(grace_secs = grace.as_secs(), "Background tasks did not stop in time");
        background.abort_all();
    }

    info!("Server stopped");
    result
}
