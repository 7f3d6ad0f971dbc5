//! Route definitions for the HTTP API.
//!
//! All routes are mounted under `/api/v1`.

use axum::Router;
use axum::routing::{get, post};

use crate::handlers;
use crate::state::AppState;

/// Build the router with every route and the shared state.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(session_routes())
        .merge(realtime_routes())
        .merge(health_routes());

    Router::new().nest("/api/v1", api_routes).with_state(state)
}

/// Session listing, termination and accounting ingestion
fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions/active", get(handlers::sessions::list_active))
        .route(
            "/sessions/terminate-bulk",
            post(handlers::sessions::terminate_bulk),
        )
        .route("/sessions/accounting", post(handlers::accounting::ingest))
        .route("/sessions/{id}", get(handlers::sessions::get_session))
        .route(
            "/sessions/{id}/terminate",
            post(handlers::sessions::terminate_session),
        )
}

/// WebSocket event channel
fn realtime_routes() -> Router<AppState> {
    Router::new().route("/ws", get(handlers::ws::ws_upgrade))
}

/// Liveness
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
