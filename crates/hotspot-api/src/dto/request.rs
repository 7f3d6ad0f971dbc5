//! Request DTOs with validation.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use hotspot_core::error::AppError;
use hotspot_core::types::SessionId;
use hotspot_entity::session::{AccountingStatus, AccountingUpdate};

/// Query of `POST /sessions/{id}/terminate`.
#[derive(Debug, Default, Deserialize)]
pub struct TerminateQuery {
    /// Terminate cause; the configured default when absent.
    pub reason: Option<String>,
}

/// Body of `POST /sessions/terminate-bulk`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BulkTerminateRequest {
    #[validate(length(min = 1, max = 10000, message = "sessionIds must not be empty"))]
    pub session_ids: Vec<String>,
    #[validate(length(max = 253))]
    pub reason: Option<String>,
}

impl BulkTerminateRequest {
    /// Parse every id, rejecting the whole request on the first bad one.
    pub fn parse_ids(&self) -> Result<Vec<SessionId>, AppError> {
        self.session_ids
            .iter()
            .map(|raw| {
                raw.parse::<SessionId>()
                    .map_err(|e| AppError::invalid_request(format!("Invalid session id {raw:?}: {e}")))
            })
            .collect()
    }
}

/// Body of `POST /sessions/accounting`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AccountingRequest {
    pub status: AccountingStatus,
    #[validate(length(min = 1, max = 253))]
    pub session_id: String,
    #[serde(default)]
    #[validate(length(max = 253))]
    pub username: String,
    #[validate(length(min = 1, max = 255))]
    pub nas_identifier: String,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub voucher_code: Option<String>,
    #[serde(default)]
    pub framed_ip: Option<String>,
    #[serde(default)]
    pub mac_address: Option<String>,
    #[serde(default)]
    pub bytes_used: u64,
    #[serde(default)]
    pub event_time: Option<DateTime<Utc>>,
}

impl TryFrom<AccountingRequest> for AccountingUpdate {
    type Error = AppError;

    fn try_from(req: AccountingRequest) -> Result<Self, Self::Error> {
        let session_id = req
            .session_id
            .parse::<SessionId>()
            .map_err(|e| AppError::invalid_request(format!("Invalid session id: {e}")))?;
        Ok(Self {
            status: req.status,
            session_id,
            username: req.username,
            nas_identifier: req.nas_identifier,
            customer_id: req.customer_id,
            voucher_code: req.voucher_code,
            framed_ip: req.framed_ip,
            mac_address: req.mac_address,
            bytes_used: req.bytes_used,
            event_time: req.event_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_bulk_request_fails_validation() {
        let req: BulkTerminateRequest = serde_json::from_str(r#"{"sessionIds":[]}"#).unwrap();
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("sessionIds must not be empty"));
    }

    #[test]
    fn test_blank_id_is_rejected() {
        let req: BulkTerminateRequest =
            serde_json::from_str(r#"{"sessionIds":["81000001","  "]}"#).unwrap();
        assert!(req.validate().is_ok());
        assert!(req.parse_ids().is_err());
    }
}
