//! A single registry slot.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use hotspot_entity::session::{SessionRecord, SessionState};

/// Mutable session data guarded by the entry lock.
#[derive(Debug)]
pub(crate) struct EntryData {
    pub record: SessionRecord,
    pub terminated_at: Option<DateTime<Utc>>,
}

/// Registry slot holding one session.
///
/// The termination state lives in an atomic so that beginning a termination
/// is a single compare-and-swap. Completions take the data write lock before
/// moving the state, and snapshots read the state under the data read lock,
/// so a snapshot never pairs a final state with a stale outcome.
#[derive(Debug)]
pub struct SessionEntry {
    state: AtomicU8,
    data: RwLock<EntryData>,
}

impl SessionEntry {
    pub(crate) fn new(record: SessionRecord) -> Self {
        let terminated_at = (record.state == SessionState::Terminated).then(Utc::now);
        Self {
            state: AtomicU8::new(record.state.as_u8()),
            data: RwLock::new(EntryData {
                record,
                terminated_at,
            }),
        }
    }

    /// Current termination state.
    pub fn state(&self) -> SessionState {
        decode(self.state.load(Ordering::Acquire))
    }

    /// Atomically move `from` to `to`. Returns the state observed on failure.
    pub(crate) fn transition(&self, from: SessionState, to: SessionState) -> Result<(), SessionState> {
        self.state
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(decode)
    }

    /// Move any state in which a termination may begin to `TERMINATION_REQUESTED`.
    pub(crate) fn try_begin(&self) -> bool {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if !decode(current).can_begin_termination() {
                return false;
            }
            match self.state.compare_exchange_weak(
                current,
                SessionState::TerminationRequested.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, EntryData> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, EntryData> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Point-in-time copy of the record with its current state.
    pub fn snapshot(&self) -> SessionRecord {
        let data = self.read();
        let mut record = data.record.clone();
        record.state = self.state();
        record
    }

    pub(crate) fn terminated_at(&self) -> Option<DateTime<Utc>> {
        self.read().terminated_at
    }
}

fn decode(raw: u8) -> SessionState {
    // Only `SessionState::as_u8` values are ever stored.
    SessionState::from_u8(raw).unwrap_or(SessionState::Active)
}
