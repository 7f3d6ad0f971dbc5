//! Accounting feed messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hotspot_core::types::SessionId;

use super::model::SessionRecord;

/// RADIUS `Acct-Status-Type` of an accounting message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountingStatus {
    /// Session opened on the NAS.
    Start,
    /// Periodic usage report.
    InterimUpdate,
    /// Session closed on the NAS.
    Stop,
}

/// One accounting message forwarded by the accounting bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountingUpdate {
    /// Message kind.
    pub status: AccountingStatus,
    /// RADIUS `Acct-Session-Id`.
    pub session_id: SessionId,
    /// RADIUS `User-Name`.
    pub username: String,
    /// NAS address (`NAS-IP-Address`, optionally with a CoA port).
    pub nas_identifier: String,
    /// Customer reference resolved by the bridge.
    #[serde(default)]
    pub customer_id: Option<String>,
    /// Voucher code, when the bridge knows it.
    #[serde(default)]
    pub voucher_code: Option<String>,
    /// `Framed-IP-Address`.
    #[serde(default)]
    pub framed_ip: Option<String>,
    /// `Calling-Station-Id`.
    #[serde(default)]
    pub mac_address: Option<String>,
    /// Input plus output octets.
    #[serde(default)]
    pub bytes_used: u64,
    /// `Event-Timestamp`; the receive time is used when absent.
    #[serde(default)]
    pub event_time: Option<DateTime<Utc>>,
}

impl AccountingUpdate {
    /// Build the record a `Start` message describes.
    pub fn to_record(&self) -> SessionRecord {
        let at = self.event_time.unwrap_or_else(Utc::now);
        let mut record = SessionRecord::new(
            self.session_id.clone(),
            self.username.clone(),
            self.nas_identifier.clone(),
            at,
        );
        record.customer_id = self.customer_id.clone();
        if self.voucher_code.is_some() {
            record.voucher_code = self.voucher_code.clone();
        }
        record.framed_ip = self.framed_ip.clone();
        record.mac_address = self.mac_address.clone();
        record.bytes_used = self.bytes_used;
        record
    }
}
