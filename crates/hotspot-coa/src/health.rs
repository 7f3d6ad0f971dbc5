//! Per-NAS reachability derived from disconnect outcomes.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;

use hotspot_entity::termination::{TerminationOutcome, TerminationReason};

/// Consecutive failures after which a NAS is reported unreachable.
const UNREACHABLE_AFTER: u32 = 3;

/// Coarse NAS health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NasStatus {
    Online,
    Degraded,
    Unreachable,
}

/// Disconnect statistics for one NAS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NasHealth {
    pub nas_identifier: String,
    pub status: NasStatus,
    pub last_reason: Option<TerminationReason>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
    pub total_requests: u64,
    pub total_acks: u64,
    pub total_naks: u64,
    pub total_failures: u64,
}

impl NasHealth {
    fn new(nas_identifier: &str) -> Self {
        Self {
            nas_identifier: nas_identifier.to_string(),
            status: NasStatus::Online,
            last_reason: None,
            last_attempt_at: None,
            consecutive_failures: 0,
            total_requests: 0,
            total_acks: 0,
            total_naks: 0,
            total_failures: 0,
        }
    }

    fn apply(&mut self, outcome: &TerminationOutcome) {
        self.total_requests += 1;
        self.last_reason = Some(outcome.reason);
        self.last_attempt_at = Some(outcome.completed_at);
        match outcome.reason {
            // Any verified reply proves the NAS is alive.
            TerminationReason::Ack => {
                self.total_acks += 1;
                self.consecutive_failures = 0;
            }
            TerminationReason::Nak => {
                self.total_naks += 1;
                self.consecutive_failures = 0;
            }
            _ => {
                self.total_failures += 1;
                self.consecutive_failures += 1;
            }
        }
        self.status = match self.consecutive_failures {
            0 => NasStatus::Online,
            n if n < UNREACHABLE_AFTER => NasStatus::Degraded,
            _ => NasStatus::Unreachable,
        };
    }
}

/// Tracks [`NasHealth`] for every NAS the dispatcher has contacted.
#[derive(Debug, Default)]
pub struct NasHealthTracker {
    by_nas: DashMap<String, NasHealth>,
}

impl NasHealthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a dispatched outcome into the NAS statistics.
    pub fn record(&self, nas_identifier: &str, outcome: &TerminationOutcome) {
        self.by_nas
            .entry(nas_identifier.to_string())
            .or_insert_with(|| NasHealth::new(nas_identifier))
            .apply(outcome);
    }

    /// Current statistics for one NAS.
    pub fn get(&self, nas_identifier: &str) -> Option<NasHealth> {
        self.by_nas.get(nas_identifier).map(|r| r.value().clone())
    }

    /// Statistics for all known NAS devices, ordered by identifier.
    pub fn snapshot(&self) -> Vec<NasHealth> {
        let mut all: Vec<NasHealth> = self.by_nas.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| a.nas_identifier.cmp(&b.nas_identifier));
        all
    }
}
