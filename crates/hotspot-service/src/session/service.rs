//! Session listing and lookup.

use std::sync::Arc;

use tracing::debug;

use hotspot_auth::{Permission, RbacEnforcer};
use hotspot_core::result::AppResult;
use hotspot_core::types::SessionId;
use hotspot_entity::session::{SessionRecord, SessionSummary};
use hotspot_session::SessionRegistry;

use crate::context::RequestContext;

/// Read access to the session registry.
#[derive(Debug, Clone)]
pub struct SessionService {
    registry: Arc<SessionRegistry>,
    rbac: Arc<RbacEnforcer>,
}

impl SessionService {
    pub fn new(registry: Arc<SessionRegistry>, rbac: Arc<RbacEnforcer>) -> Self {
        Self { registry, rbac }
    }

    /// Summaries of all sessions that are not terminated, oldest first.
    pub fn list_active(&self, ctx: &RequestContext) -> AppResult<Vec<SessionSummary>> {
        self.rbac
            .require_permission(&ctx.role, &Permission::SessionView)?;
        let sessions: Vec<SessionSummary> = self
            .registry
            .list_active()
            .iter()
            .map(SessionRecord::summary)
            .collect();
        debug!(operator = %ctx.operator_id, count = sessions.len(), "Listed active sessions");
        Ok(sessions)
    }

    /// Full record of one session, terminated ones included.
    pub fn get(&self, ctx: &RequestContext, session_id: &SessionId) -> AppResult<SessionRecord> {
        self.rbac
            .require_permission(&ctx.role, &Permission::SessionView)?;
        self.registry.get(session_id)
    }
}
