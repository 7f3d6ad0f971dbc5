//! # hotspot-api
//!
//! HTTP API layer built on Axum.
//!
//! Provides the session administration endpoints under `/api/v1`, the
//! WebSocket event channel, bearer token extraction, request validation and
//! error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use error::ApiError;
pub use state::AppState;
