//! Aggregate result of a bulk termination.

use serde::{Deserialize, Serialize};

use hotspot_core::types::SessionId;

use super::outcome::{TerminationOutcome, TerminationReason};

/// Overall verdict of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BulkStatus {
    /// Every requested session was disconnected.
    AllSucceeded,
    /// Some but not all sessions were disconnected.
    Partial,
    /// No session was disconnected.
    NoneSucceeded,
}

/// Report returned by a bulk termination.
///
/// `outcomes` is in completion order. Unknown ids appear only in `unknown`
/// and never produce an outcome. Every other requested id lands in exactly
/// one bucket: `succeeded`, `failed` (dispatched and not acknowledged),
/// `duplicates` or `not_dispatched`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkTerminationReport {
    pub outcomes: Vec<TerminationOutcome>,
    pub requested: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub duplicates: usize,
    pub unknown: Vec<SessionId>,
    pub not_dispatched: Vec<SessionId>,
    pub status: BulkStatus,
}

impl BulkTerminationReport {
    /// Start an empty report for `requested` ids.
    pub fn new(requested: usize) -> Self {
        Self {
            outcomes: Vec::with_capacity(requested),
            requested,
            succeeded: 0,
            failed: 0,
            duplicates: 0,
            unknown: Vec::new(),
            not_dispatched: Vec::new(),
            status: BulkStatus::NoneSucceeded,
        }
    }

    /// Append an outcome and update the counters.
    pub fn record(&mut self, outcome: TerminationOutcome) {
        match outcome.reason {
            _ if outcome.succeeded => self.succeeded += 1,
            TerminationReason::AlreadyInProgress => self.duplicates += 1,
            TerminationReason::NotDispatched => {
                self.not_dispatched.push(outcome.session_id.clone())
            }
            _ => self.failed += 1,
        }
        self.outcomes.push(outcome);
    }

    /// Note an id that is not in the registry.
    pub fn mark_unknown(&mut self, session_id: SessionId) {
        self.unknown.push(session_id);
    }

    /// Compute the final status.
    pub fn finish(mut self) -> Self {
        self.status = if self.succeeded == 0 {
            BulkStatus::NoneSucceeded
        } else if self.succeeded == self.requested {
            BulkStatus::AllSucceeded
        } else {
            BulkStatus::Partial
        };
        self
    }
}
