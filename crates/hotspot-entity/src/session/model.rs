//! Session record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hotspot_core::types::SessionId;

use super::state::SessionState;
use crate::termination::TerminationOutcome;

/// One currently-or-recently-active network access session.
///
/// Records are owned by the session registry; everything outside it works
/// on cloned snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// RADIUS `Acct-Session-Id`.
    pub session_id: SessionId,
    /// RADIUS `User-Name` the NAS authenticated.
    pub username: String,
    /// Owning customer (back-reference only).
    pub customer_id: Option<String>,
    /// Voucher the session was opened with (back-reference only).
    pub voucher_code: Option<String>,
    /// `host` or `host:port` of the NAS enforcing the session.
    pub nas_identifier: String,
    /// Address assigned to the client device.
    pub framed_ip: Option<String>,
    /// Client MAC address as reported by the NAS.
    pub mac_address: Option<String>,
    /// When accounting first reported the session.
    pub started_at: DateTime<Utc>,
    /// Last accounting update (advisory).
    pub last_seen_at: DateTime<Utc>,
    /// Octets transferred in both directions.
    pub bytes_used: u64,
    /// Termination state.
    pub state: SessionState,
    /// Result of the most recent disconnect attempt.
    pub last_outcome: Option<TerminationOutcome>,
}

impl SessionRecord {
    /// Create an `ACTIVE` record first reported at `started_at`.
    pub fn new(
        session_id: SessionId,
        username: impl Into<String>,
        nas_identifier: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let username = username.into();
        let voucher_code = voucher_from_username(&username);
        Self {
            session_id,
            username,
            customer_id: None,
            voucher_code,
            nas_identifier: nas_identifier.into(),
            framed_ip: None,
            mac_address: None,
            started_at,
            last_seen_at: started_at,
            bytes_used: 0,
            state: SessionState::Active,
            last_outcome: None,
        }
    }

    /// Seconds since the session started, as of `now`.
    pub fn duration_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.started_at).num_seconds().max(0)
    }

    /// Lightweight view used in listings and events.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id.clone(),
            username: self.username.clone(),
            voucher_code: self.voucher_code.clone(),
            customer_id: self.customer_id.clone(),
            nas_identifier: self.nas_identifier.clone(),
            framed_ip: self.framed_ip.clone(),
            started_at: self.started_at,
            last_seen_at: self.last_seen_at,
            duration_seconds: self.duration_seconds(Utc::now()),
            bytes_used: self.bytes_used,
            state: self.state,
        }
    }
}

/// Session view exposed to administrators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// RADIUS `Acct-Session-Id`.
    pub session_id: SessionId,
    /// RADIUS `User-Name`.
    pub username: String,
    /// Voucher code, if known.
    pub voucher_code: Option<String>,
    /// Customer, if known.
    pub customer_id: Option<String>,
    /// Enforcing NAS.
    pub nas_identifier: String,
    /// Client address.
    pub framed_ip: Option<String>,
    /// Start time.
    pub started_at: DateTime<Utc>,
    /// Last accounting update.
    pub last_seen_at: DateTime<Utc>,
    /// Seconds since start.
    pub duration_seconds: i64,
    /// Octets transferred.
    pub bytes_used: u64,
    /// Termination state.
    pub state: SessionState,
}

/// Extract the voucher code from a `phone_voucher` RADIUS username.
pub fn voucher_from_username(username: &str) -> Option<String> {
    username
        .split_once('_')
        .map(|(_, voucher)| voucher)
        .filter(|voucher| !voucher.is_empty())
        .map(str::to_string)
}
