//! Accounting feed ingestion.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use hotspot_auth::{Permission, RbacEnforcer};
use hotspot_core::result::AppResult;
use hotspot_entity::session::{AccountingStatus, AccountingUpdate, SessionState};
use hotspot_realtime::{EventBroadcaster, EventPayload, SessionMonitor, Topic};
use hotspot_session::{InsertOutcome, SessionRegistry};

use crate::context::RequestContext;

/// What an accounting message did to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountingAction {
    /// A new session is now tracked.
    Created,
    /// A tracked session was refreshed.
    Updated,
    /// A stopped session is no longer tracked.
    Removed,
    /// A stop for a session that was not tracked.
    Ignored,
}

/// Applies accounting start, interim and stop messages to the registry.
#[derive(Debug, Clone)]
pub struct AccountingService {
    registry: Arc<SessionRegistry>,
    broadcaster: Arc<EventBroadcaster>,
    monitor: SessionMonitor,
    rbac: Arc<RbacEnforcer>,
}

impl AccountingService {
    pub fn new(
        registry: Arc<SessionRegistry>,
        broadcaster: Arc<EventBroadcaster>,
        rbac: Arc<RbacEnforcer>,
    ) -> Self {
        let monitor = SessionMonitor::new(Arc::clone(&registry), Arc::clone(&broadcaster));
        Self {
            registry,
            broadcaster,
            monitor,
            rbac,
        }
    }

    /// Apply one accounting message and publish the change.
    ///
    /// An interim update for an untracked session is treated as a start,
    /// since the start may have been missed.
    pub fn ingest(&self, ctx: &RequestContext, update: AccountingUpdate) -> AppResult<AccountingAction> {
        self.rbac
            .require_permission(&ctx.role, &Permission::AccountingIngest)?;

        let action = match update.status {
            AccountingStatus::Start => self.start(&update),
            AccountingStatus::InterimUpdate => {
                let seen_at = update.event_time.unwrap_or_else(Utc::now);
                match self
                    .registry
                    .record_usage(&update.session_id, update.bytes_used, seen_at)
                {
                    Ok(record) => {
                        self.broadcaster.publish(
                            Topic::Sessions,
                            EventPayload::SessionUpdate {
                                session: record.summary(),
                            },
                        );
                        AccountingAction::Updated
                    }
                    Err(_) => {
                        debug!(session_id = %update.session_id, "Interim update for untracked session");
                        self.start(&update)
                    }
                }
            }
            AccountingStatus::Stop => match self.registry.remove(&update.session_id) {
                Some(mut record) => {
                    record.state = SessionState::Terminated;
                    record.bytes_used = record.bytes_used.max(update.bytes_used);
                    info!(
                        session_id = %record.session_id,
                        nas = %record.nas_identifier,
                        "Session stopped by NAS"
                    );
                    self.broadcaster.publish(
                        Topic::Sessions,
                        EventPayload::SessionUpdate {
                            session: record.summary(),
                        },
                    );
                    AccountingAction::Removed
                }
                None => AccountingAction::Ignored,
            },
        };

        if action != AccountingAction::Ignored {
            self.monitor.push_update();
        }
        Ok(action)
    }

    fn start(&self, update: &AccountingUpdate) -> AccountingAction {
        let record = update.to_record();
        let session = record.summary();
        match self.registry.insert(record) {
            InsertOutcome::Created => {
                info!(
                    session_id = %session.session_id,
                    nas = %session.nas_identifier,
                    "Session started"
                );
                self.broadcaster
                    .publish(Topic::Sessions, EventPayload::SessionCreated { session });
                AccountingAction::Created
            }
            InsertOutcome::Updated => {
                let session = self
                    .registry
                    .get(&session.session_id)
                    .map(|record| record.summary())
                    .unwrap_or(session);
                self.broadcaster
                    .publish(Topic::Sessions, EventPayload::SessionUpdate { session });
                AccountingAction::Updated
            }
        }
    }
}
