//! Accounting feed ingestion handler.

use axum::Json;
use axum::extract::State;

use hotspot_entity::session::AccountingUpdate;

use crate::dto::request::AccountingRequest;
use crate::dto::response::AccountingResponse;
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidJson};
use crate::state::AppState;

/// POST /api/v1/sessions/accounting
pub async fn ingest(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<AccountingRequest>,
) -> Result<Json<AccountingResponse>, ApiError> {
    let update = AccountingUpdate::try_from(req)?;
    let action = state.accounting_service.ingest(&auth, update)?;
    Ok(Json(AccountingResponse::new(action)))
}
