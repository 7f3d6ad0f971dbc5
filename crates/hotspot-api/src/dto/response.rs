//! Response DTOs.

use serde::Serialize;

use hotspot_entity::session::{SessionRecord, SessionSummary};
use hotspot_entity::termination::{BulkTerminationReport, TerminationOutcome};
use hotspot_realtime::{RealtimeMetricsSnapshot, SessionCounts};
use hotspot_service::AccountingAction;

const SUCCESS: &str = "success";

/// `GET /sessions/active`.
#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub status: &'static str,
    pub count: usize,
    pub sessions: Vec<SessionSummary>,
}

impl SessionListResponse {
    pub fn new(sessions: Vec<SessionSummary>) -> Self {
        Self {
            status: SUCCESS,
            count: sessions.len(),
            sessions,
        }
    }
}

/// `GET /sessions/{id}`.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub status: &'static str,
    pub session: SessionRecord,
}

impl SessionResponse {
    pub fn new(session: SessionRecord) -> Self {
        Self {
            status: SUCCESS,
            session,
        }
    }
}

/// `POST /sessions/{id}/terminate`.
///
/// `status` is `error` when the NAS did not acknowledge the disconnect.
#[derive(Debug, Serialize)]
pub struct TerminationResponse {
    pub status: &'static str,
    pub message: String,
    pub outcome: TerminationOutcome,
}

impl From<TerminationOutcome> for TerminationResponse {
    fn from(outcome: TerminationOutcome) -> Self {
        Self {
            status: if outcome.succeeded { SUCCESS } else { "error" },
            message: outcome.describe(),
            outcome,
        }
    }
}

/// `POST /sessions/terminate-bulk`.
#[derive(Debug, Serialize)]
pub struct BulkTerminationResponse {
    pub status: &'static str,
    pub result: BulkTerminationReport,
}

impl BulkTerminationResponse {
    pub fn new(result: BulkTerminationReport) -> Self {
        Self {
            status: SUCCESS,
            result,
        }
    }
}

/// `POST /sessions/accounting`.
#[derive(Debug, Serialize)]
pub struct AccountingResponse {
    pub status: &'static str,
    pub action: AccountingAction,
}

impl AccountingResponse {
    pub fn new(action: AccountingAction) -> Self {
        Self {
            status: SUCCESS,
            action,
        }
    }
}

/// `GET /health`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub sessions: SessionCounts,
    pub known_nas: usize,
    pub realtime: RealtimeMetricsSnapshot,
}
