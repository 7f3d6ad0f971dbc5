//! FreeRADIUS `radacct` repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, info};

use hotspot_core::error::{AppError, ErrorKind};
use hotspot_core::result::AppResult;
use hotspot_core::types::SessionId;
use hotspot_entity::session::SessionRecord;
use hotspot_session::SessionStore;

/// Open accounting row as selected for a registry rebuild.
#[derive(Debug, Clone, sqlx::FromRow)]
struct OpenSessionRow {
    acctsessionid: String,
    username: String,
    nasipaddress: String,
    framedipaddress: Option<String>,
    callingstationid: Option<String>,
    acctstarttime: Option<DateTime<Utc>>,
    bytes_used: i64,
}

impl OpenSessionRow {
    fn into_record(self) -> SessionRecord {
        let started_at = self.acctstarttime.unwrap_or_else(Utc::now);
        let mut record = SessionRecord::new(
            SessionId::new(self.acctsessionid),
            self.username,
            strip_prefix_len(&self.nasipaddress),
            started_at,
        );
        record.framed_ip = self
            .framedipaddress
            .map(|ip| strip_prefix_len(&ip))
            .filter(|ip| !ip.is_empty());
        record.mac_address = self.callingstationid.filter(|mac| !mac.is_empty());
        record.bytes_used = u64::try_from(self.bytes_used).unwrap_or(0);
        record
    }
}

/// Repository over the accounting table the RADIUS server writes.
#[derive(Debug, Clone)]
pub struct RadacctRepository {
    pool: PgPool,
}

impl RadacctRepository {
    /// Create a new repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Sessions without a stop time, oldest first.
    pub async fn find_open(&self) -> AppResult<Vec<SessionRecord>> {
        let rows = sqlx::query_as::<_, OpenSessionRow>(
            "SELECT acctsessionid, username, \
                    CAST(nasipaddress AS TEXT) AS nasipaddress, \
                    CAST(framedipaddress AS TEXT) AS framedipaddress, \
                    callingstationid, acctstarttime, \
                    COALESCE(acctinputoctets, 0) + COALESCE(acctoutputoctets, 0) AS bytes_used \
             FROM radacct WHERE acctstoptime IS NULL ORDER BY acctstarttime",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load open sessions", e)
        })?;

        Ok(rows.into_iter().map(OpenSessionRow::into_record).collect())
    }

    /// Close the open accounting row of a session.
    pub async fn close_session(
        &self,
        session_id: &SessionId,
        terminate_cause: &str,
        stopped_at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE radacct SET acctstoptime = $2, acctterminatecause = $3 \
             WHERE acctsessionid = $1 AND acctstoptime IS NULL",
        )
        .bind(session_id.as_str())
        .bind(stopped_at)
        .bind(terminate_cause)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to close accounting session", e)
        })?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl SessionStore for RadacctRepository {
    async fn load_open_sessions(&self) -> AppResult<Vec<SessionRecord>> {
        let records = self.find_open().await?;
        info!(count = records.len(), "Loaded open sessions from radacct");
        Ok(records)
    }

    async fn mark_terminated(
        &self,
        session_id: &SessionId,
        terminate_cause: &str,
        stopped_at: DateTime<Utc>,
    ) -> AppResult<()> {
        let affected = self
            .close_session(session_id, terminate_cause, stopped_at)
            .await?;
        if affected == 0 {
            debug!(session_id = %session_id, "No open radacct row to close");
        }
        Ok(())
    }
}

/// `inet` columns render as `addr/32`; keep the address only.
fn strip_prefix_len(raw: &str) -> String {
    raw.split('/').next().unwrap_or(raw).trim().to_string()
}
