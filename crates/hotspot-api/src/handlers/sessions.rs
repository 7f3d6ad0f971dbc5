//! Session listing and termination handlers.

use axum::Json;
use axum::extract::{Path, Query, State};

use hotspot_core::error::AppError;
use hotspot_core::types::SessionId;

use crate::dto::request::{BulkTerminateRequest, TerminateQuery};
use crate::dto::response::{
    BulkTerminationResponse, SessionListResponse, SessionResponse, TerminationResponse,
};
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidJson};
use crate::state::AppState;

fn parse_id(raw: &str) -> Result<SessionId, AppError> {
    raw.parse()
        .map_err(|e| AppError::invalid_request(format!("Invalid session id: {e}")))
}

/// GET /api/v1/sessions/active
pub async fn list_active(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<SessionListResponse>, ApiError> {
    let sessions = state.session_service.list_active(&auth)?;
    Ok(Json(SessionListResponse::new(sessions)))
}

/// GET /api/v1/sessions/{id}
pub async fn get_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state.session_service.get(&auth, &parse_id(&id)?)?;
    Ok(Json(SessionResponse::new(session)))
}

/// POST /api/v1/sessions/{id}/terminate?reason=
pub async fn terminate_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Query(query): Query<TerminateQuery>,
) -> Result<Json<TerminationResponse>, ApiError> {
    let outcome = state
        .termination_service
        .terminate_one(&auth, &parse_id(&id)?, query.reason.as_deref())
        .await?;
    Ok(Json(TerminationResponse::from(outcome)))
}

/// POST /api/v1/sessions/terminate-bulk
pub async fn terminate_bulk(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<BulkTerminateRequest>,
) -> Result<Json<BulkTerminationResponse>, ApiError> {
    let session_ids = req.parse_ids()?;
    let report = state
        .termination_service
        .terminate_many(
            &auth,
            session_ids,
            req.reason.as_deref(),
            state.shutdown.child_token(),
        )
        .await?;
    Ok(Json(BulkTerminationResponse::new(report)))
}
