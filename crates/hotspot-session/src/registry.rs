//! Session registry: authoritative index of live access sessions.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, warn};

use hotspot_core::error::AppError;
use hotspot_core::result::AppResult;
use hotspot_core::types::SessionId;
use hotspot_entity::session::{SessionRecord, SessionState};
use hotspot_entity::termination::TerminationOutcome;

use crate::entry::SessionEntry;

/// Whether an accounting start created a new record or refreshed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The session was not tracked before.
    Created,
    /// The session was already tracked; its metadata was refreshed.
    Updated,
}

/// Number of tracked sessions per termination state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateCounts {
    pub active: usize,
    pub termination_requested: usize,
    pub termination_failed: usize,
    pub terminated: usize,
}

/// Sharded index of session entries.
///
/// Reads walk the shards and copy each record under its own read lock; there
/// is no registry-wide lock. Termination state only changes through
/// [`SessionRegistry::try_begin_termination`],
/// [`SessionRegistry::complete_termination`] and
/// [`SessionRegistry::release_termination`].
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Arc<SessionEntry>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    fn entry(&self, session_id: &SessionId) -> Option<Arc<SessionEntry>> {
        self.sessions.get(session_id).map(|r| Arc::clone(r.value()))
    }

    fn not_found(session_id: &SessionId) -> AppError {
        AppError::not_found(format!("Session {session_id} not found"))
    }

    /// Snapshot of every non-terminated session, ordered by start time then id.
    pub fn list_active(&self) -> Vec<SessionRecord> {
        let mut records: Vec<SessionRecord> = self
            .sessions
            .iter()
            .map(|r| r.value().snapshot())
            .filter(|record| record.state.is_live())
            .collect();
        records.sort_by(|a, b| {
            a.started_at
                .cmp(&b.started_at)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        records
    }

    /// Snapshot of one session.
    pub fn get(&self, session_id: &SessionId) -> AppResult<SessionRecord> {
        self.entry(session_id)
            .map(|entry| entry.snapshot())
            .ok_or_else(|| Self::not_found(session_id))
    }

    /// Current termination state of one session, if tracked.
    pub fn state_of(&self, session_id: &SessionId) -> Option<SessionState> {
        self.entry(session_id).map(|entry| entry.state())
    }

    /// Claim the session for a termination.
    ///
    /// Succeeds only for `ACTIVE` or `TERMINATION_FAILED` records; returns
    /// `false` for unknown ids and for sessions already requested or
    /// terminated. Of any number of concurrent callers at most one wins.
    pub fn try_begin_termination(&self, session_id: &SessionId) -> bool {
        let Some(entry) = self.entry(session_id) else {
            return false;
        };
        let claimed = entry.try_begin();
        debug!(session_id = %session_id, claimed, "Termination claim");
        claimed
    }

    /// Record the outcome of a dispatched termination.
    ///
    /// Moves `TERMINATION_REQUESTED` to `TERMINATED` on success or to
    /// `TERMINATION_FAILED` otherwise. A record in any other state is left
    /// as is and its current state is returned.
    pub fn complete_termination(
        &self,
        session_id: &SessionId,
        outcome: &TerminationOutcome,
    ) -> AppResult<SessionState> {
        let entry = self
            .entry(session_id)
            .ok_or_else(|| Self::not_found(session_id))?;

        let target = if outcome.succeeded {
            SessionState::Terminated
        } else {
            SessionState::TerminationFailed
        };

        let mut data = entry.write();
        match entry.transition(SessionState::TerminationRequested, target) {
            Ok(()) => {
                data.record.last_outcome = Some(outcome.clone());
                if outcome.succeeded {
                    data.terminated_at = Some(outcome.completed_at);
                }
                Ok(target)
            }
            Err(observed) => {
                warn!(
                    session_id = %session_id,
                    state = %observed,
                    reason = %outcome.reason,
                    "Termination outcome for session not awaiting one; ignored"
                );
                Ok(observed)
            }
        }
    }

    /// Return a claimed but never dispatched session to `ACTIVE`.
    pub fn release_termination(&self, session_id: &SessionId) -> bool {
        self.entry(session_id)
            .map(|entry| {
                entry
                    .transition(SessionState::TerminationRequested, SessionState::Active)
                    .is_ok()
            })
            .unwrap_or(false)
    }

    /// Track a session reported by an accounting start.
    ///
    /// A live record with the same id has its metadata refreshed and keeps
    /// its termination state. A terminated record with the same id is
    /// replaced, since the NAS has reused the id.
    pub fn insert(&self, record: SessionRecord) -> InsertOutcome {
        match self.sessions.entry(record.session_id.clone()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().state() == SessionState::Terminated {
                    occupied.insert(Arc::new(SessionEntry::new(record)));
                    return InsertOutcome::Created;
                }
                let entry = occupied.get();
                let mut data = entry.write();
                let current = &mut data.record;
                current.username = record.username;
                current.nas_identifier = record.nas_identifier;
                current.customer_id = record.customer_id.or(current.customer_id.take());
                current.voucher_code = record.voucher_code.or(current.voucher_code.take());
                current.framed_ip = record.framed_ip.or(current.framed_ip.take());
                current.mac_address = record.mac_address.or(current.mac_address.take());
                current.bytes_used = current.bytes_used.max(record.bytes_used);
                current.last_seen_at = current.last_seen_at.max(record.last_seen_at);
                InsertOutcome::Updated
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Arc::new(SessionEntry::new(record)));
                InsertOutcome::Created
            }
        }
    }

    /// Apply an interim usage report.
    pub fn record_usage(
        &self,
        session_id: &SessionId,
        bytes_used: u64,
        seen_at: DateTime<Utc>,
    ) -> AppResult<SessionRecord> {
        let entry = self
            .entry(session_id)
            .ok_or_else(|| Self::not_found(session_id))?;
        {
            let mut data = entry.write();
            data.record.bytes_used = data.record.bytes_used.max(bytes_used);
            data.record.last_seen_at = data.record.last_seen_at.max(seen_at);
        }
        Ok(entry.snapshot())
    }

    /// Stop tracking a session, returning its last snapshot.
    pub fn remove(&self, session_id: &SessionId) -> Option<SessionRecord> {
        self.sessions
            .remove(session_id)
            .map(|(_, entry)| entry.snapshot())
    }

    /// Drop terminated sessions whose termination is older than `retention`.
    pub fn purge_terminated(&self, retention: Duration) -> Vec<SessionId> {
        let cutoff = Utc::now() - retention;
        let expired = |entry: &SessionEntry| {
            entry.state() == SessionState::Terminated
                && entry.terminated_at().is_none_or(|at| at <= cutoff)
        };

        let candidates: Vec<SessionId> = self
            .sessions
            .iter()
            .filter(|r| expired(r.value()))
            .map(|r| r.key().clone())
            .collect();

        candidates
            .into_iter()
            .filter(|id| self.sessions.remove_if(id, |_, entry| expired(entry)).is_some())
            .collect()
    }

    /// Replace the whole registry, e.g. when rebuilding from persistence.
    ///
    /// Not atomic with respect to concurrent readers; intended for start-up.
    pub fn replace_all(&self, records: Vec<SessionRecord>) -> usize {
        self.sessions.clear();
        for record in records {
            self.sessions
                .insert(record.session_id.clone(), Arc::new(SessionEntry::new(record)));
        }
        self.sessions.len()
    }

    /// Number of sessions that are not terminated.
    pub fn active_count(&self) -> usize {
        self.sessions
            .iter()
            .filter(|r| r.value().state().is_live())
            .count()
    }

    /// Number of tracked sessions in each state.
    pub fn state_counts(&self) -> StateCounts {
        let mut counts = StateCounts::default();
        for r in self.sessions.iter() {
            match r.value().state() {
                SessionState::Active => counts.active += 1,
                SessionState::TerminationRequested => counts.termination_requested += 1,
                SessionState::TerminationFailed => counts.termination_failed += 1,
                SessionState::Terminated => counts.terminated += 1,
            }
        }
        counts
    }

    /// Live sessions grouped by enforcing NAS.
    pub fn sessions_by_nas(&self) -> BTreeMap<String, usize> {
        let mut by_nas = BTreeMap::new();
        for r in self.sessions.iter() {
            let entry = r.value();
            if entry.state().is_live() {
                let nas = entry.read().record.nas_identifier.clone();
                *by_nas.entry(nas).or_insert(0) += 1;
            }
        }
        by_nas
    }

    /// Total tracked sessions, terminated ones included.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotspot_entity::termination::TerminationReason;

    fn record(id: &str, started_offset_secs: i64) -> SessionRecord {
        SessionRecord::new(
            SessionId::new(id),
            format!("0712_{id}"),
            "10.0.0.1",
            Utc::now() + Duration::seconds(started_offset_secs),
        )
    }

    fn registry_with(ids: &[&str]) -> SessionRegistry {
        let registry = SessionRegistry::new();
        for (i, id) in ids.iter().enumerate() {
            registry.insert(record(id, i as i64));
        }
        registry
    }

    #[test]
    fn test_second_begin_is_rejected() {
        let registry = registry_with(&["a"]);
        let id = SessionId::new("a");
        assert!(registry.try_begin_termination(&id));
        assert!(!registry.try_begin_termination(&id));
        assert_eq!(registry.state_of(&id), Some(SessionState::TerminationRequested));
    }

    #[test]
    fn test_begin_unknown_is_false() {
        let registry = SessionRegistry::new();
        assert!(!registry.try_begin_termination(&SessionId::new("ghost")));
    }

    #[test]
    fn test_ack_terminates_and_hides_from_listing() {
        let registry = registry_with(&["a", "b"]);
        let id = SessionId::new("a");
        assert!(registry.try_begin_termination(&id));
        let state = registry
            .complete_termination(&id, &TerminationOutcome::ack(id.clone(), 1))
            .unwrap();
        assert_eq!(state, SessionState::Terminated);
        let listed: Vec<_> = registry.list_active().into_iter().map(|r| r.session_id).collect();
        assert_eq!(listed, vec![SessionId::new("b")]);
        assert!(!registry.try_begin_termination(&id));
        assert_eq!(registry.get(&id).unwrap().last_outcome.unwrap().reason, TerminationReason::Ack);
    }

    #[test]
    fn test_failed_termination_can_be_retried() {
        let registry = registry_with(&["a"]);
        let id = SessionId::new("a");
        assert!(registry.try_begin_termination(&id));
        let outcome = TerminationOutcome::failed(id.clone(), TerminationReason::Timeout, 3, None);
        assert_eq!(
            registry.complete_termination(&id, &outcome).unwrap(),
            SessionState::TerminationFailed
        );
        assert!(registry.try_begin_termination(&id));
    }

    #[test]
    fn test_complete_without_claim_reports_current_state() {
        let registry = registry_with(&["a"]);
        let id = SessionId::new("a");
        let state = registry
            .complete_termination(&id, &TerminationOutcome::ack(id.clone(), 1))
            .unwrap();
        assert_eq!(state, SessionState::Active);
        assert_eq!(registry.get(&id).unwrap().state, SessionState::Active);
    }

    #[test]
    fn test_complete_unknown_is_not_found() {
        let registry = SessionRegistry::new();
        let id = SessionId::new("ghost");
        let err = registry
            .complete_termination(&id, &TerminationOutcome::ack(id.clone(), 1))
            .unwrap_err();
        assert_eq!(err.kind, hotspot_core::error::ErrorKind::NotFound);
    }

    #[test]
    fn test_release_returns_to_active() {
        let registry = registry_with(&["a"]);
        let id = SessionId::new("a");
        assert!(!registry.release_termination(&id));
        assert!(registry.try_begin_termination(&id));
        assert!(registry.release_termination(&id));
        assert_eq!(registry.state_of(&id), Some(SessionState::Active));
    }

    #[test]
    fn test_listing_is_ordered_by_start_then_id() {
        let registry = SessionRegistry::new();
        let start = Utc::now();
        for id in ["c", "a", "b"] {
            registry.insert(SessionRecord::new(SessionId::new(id), "u", "nas", start));
        }
        registry.insert(SessionRecord::new(
            SessionId::new("0-early"),
            "u",
            "nas",
            start - Duration::minutes(5),
        ));
        let ids: Vec<String> = registry
            .list_active()
            .into_iter()
            .map(|r| r.session_id.into_inner())
            .collect();
        assert_eq!(ids, vec!["0-early", "a", "b", "c"]);
    }

    #[test]
    fn test_insert_existing_refreshes_but_keeps_state() {
        let registry = registry_with(&["a"]);
        let id = SessionId::new("a");
        assert!(registry.try_begin_termination(&id));
        let mut again = record("a", 0);
        again.bytes_used = 4096;
        assert_eq!(registry.insert(again), InsertOutcome::Updated);
        let snapshot = registry.get(&id).unwrap();
        assert_eq!(snapshot.bytes_used, 4096);
        assert_eq!(snapshot.state, SessionState::TerminationRequested);
    }

    #[test]
    fn test_usage_never_goes_backwards() {
        let registry = registry_with(&["a"]);
        let id = SessionId::new("a");
        registry.record_usage(&id, 500, Utc::now()).unwrap();
        let snapshot = registry.record_usage(&id, 100, Utc::now()).unwrap();
        assert_eq!(snapshot.bytes_used, 500);
        assert!(registry.record_usage(&SessionId::new("x"), 1, Utc::now()).is_err());
    }

    #[test]
    fn test_purge_only_removes_terminated() {
        let registry = registry_with(&["a", "b"]);
        let id = SessionId::new("a");
        assert!(registry.try_begin_termination(&id));
        registry
            .complete_termination(&id, &TerminationOutcome::ack(id.clone(), 1))
            .unwrap();
        assert!(registry.purge_terminated(Duration::hours(1)).is_empty());
        assert_eq!(registry.purge_terminated(Duration::zero()), vec![id]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_counts_and_nas_grouping() {
        let registry = registry_with(&["a", "b", "c"]);
        let mut other = record("d", 0);
        other.nas_identifier = "10.0.0.9:3799".into();
        registry.insert(other);
        assert!(registry.try_begin_termination(&SessionId::new("b")));

        let counts = registry.state_counts();
        assert_eq!(counts.active, 3);
        assert_eq!(counts.termination_requested, 1);
        assert_eq!(registry.active_count(), 4);

        let by_nas = registry.sessions_by_nas();
        assert_eq!(by_nas.get("10.0.0.1"), Some(&3));
        assert_eq!(by_nas.get("10.0.0.9:3799"), Some(&1));
    }

    #[test]
    fn test_replace_all_rebuilds() {
        let registry = registry_with(&["a"]);
        let loaded = registry.replace_all(vec![record("x", 0), record("y", 1)]);
        assert_eq!(loaded, 2);
        assert!(registry.get(&SessionId::new("a")).is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_begin_has_single_winner() {
        let registry = Arc::new(registry_with(&["contended"]));
        let handles: Vec<_> = (0..32)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move {
                    registry.try_begin_termination(&SessionId::new("contended"))
                })
            })
            .collect();
        let results = futures::future::join_all(handles).await;
        let winners = results.into_iter().filter(|r| *r.as_ref().unwrap()).count();
        assert_eq!(winners, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_snapshots_stay_consistent_under_completions() {
        let ids: Vec<String> = (0..200).map(|i| format!("s{i:03}")).collect();
        let registry = Arc::new(SessionRegistry::new());
        for id in &ids {
            registry.insert(record(id, 0));
            assert!(registry.try_begin_termination(&SessionId::new(id.as_str())));
        }

        let writer = {
            let registry = Arc::clone(&registry);
            let ids = ids.clone();
            tokio::spawn(async move {
                for id in ids {
                    let id = SessionId::new(id);
                    registry
                        .complete_termination(&id, &TerminationOutcome::ack(id.clone(), 1))
                        .unwrap();
                    tokio::task::yield_now().await;
                }
            })
        };

        for _ in 0..50 {
            for snapshot in registry.list_active() {
                assert_eq!(snapshot.state, SessionState::TerminationRequested);
                assert!(snapshot.last_outcome.is_none());
            }
            tokio::task::yield_now().await;
        }
        writer.await.unwrap();
        assert!(registry.list_active().is_empty());
        assert_eq!(registry.state_counts().terminated, 200);
    }
}
