//! Persistence seam for session records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use hotspot_core::result::AppResult;
use hotspot_core::types::SessionId;
use hotspot_entity::session::SessionRecord;

/// Durable backing for the session registry.
#[async_trait]
pub trait SessionStore: Send + Sync + std::fmt::Debug {
    /// Load the sessions that are still open, to rebuild the registry.
    async fn load_open_sessions(&self) -> AppResult<Vec<SessionRecord>>;

    /// Stamp a session as stopped with the given terminate cause.
    async fn mark_terminated(
        &self,
        session_id: &SessionId,
        terminate_cause: &str,
        stopped_at: DateTime<Utc>,
    ) -> AppResult<()>;
}

/// Store used when no accounting database is configured.
///
/// Starts from a fixed seed and remembers terminations in memory only.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    seed: Vec<SessionRecord>,
    terminated: DashMap<SessionId, (String, DateTime<Utc>)>,
}

impl MemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that reports `seed` as the open sessions.
    pub fn with_sessions(seed: Vec<SessionRecord>) -> Self {
        Self {
            seed,
            terminated: DashMap::new(),
        }
    }

    /// Terminate cause recorded for a session, if any.
    pub fn terminate_cause(&self, session_id: &SessionId) -> Option<String> {
        self.terminated
            .get(session_id)
            .map(|r| r.value().0.clone())
    }

    /// Number of sessions stamped as terminated.
    pub fn terminated_count(&self) -> usize {
        self.terminated.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load_open_sessions(&self) -> AppResult<Vec<SessionRecord>> {
        Ok(self
            .seed
            .iter()
            .filter(|record| !self.terminated.contains_key(&record.session_id))
            .cloned()
            .collect())
    }

    async fn mark_terminated(
        &self,
        session_id: &SessionId,
        terminate_cause: &str,
        stopped_at: DateTime<Utc>,
    ) -> AppResult<()> {
        self.terminated
            .insert(session_id.clone(), (terminate_cause.to_string(), stopped_at));
        Ok(())
    }
}
