//! Termination coordination settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Bulk termination and archival configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminationConfig {
    /// Maximum concurrent Disconnect-Requests in flight for one batch.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Deadline after which a batch stops starting new dispatches (0 = none).
    #[serde(default = "default_batch_deadline")]
    pub batch_deadline_seconds: u64,
    /// Reason used when a single termination names none.
    #[serde(default = "default_single_reason")]
    pub default_reason: String,
    /// Reason used when a bulk termination names none.
    #[serde(default = "default_bulk_reason")]
    pub default_bulk_reason: String,
    /// How long terminated records stay visible before archival, in seconds.
    #[serde(default = "default_retention")]
    pub terminated_retention_seconds: u64,
    /// Interval of the archival sweep, in seconds.
    #[serde(default = "default_purge_interval")]
    pub purge_interval_seconds: u64,
}

impl TerminationConfig {
    /// Batch deadline, if one is configured.
    pub fn batch_deadline(&self) -> Option<Duration> {
        (self.batch_deadline_seconds > 0).then(|| Duration::from_secs(self.batch_deadline_seconds))
    }
}

impl Default for TerminationConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            batch_deadline_seconds: default_batch_deadline(),
            default_reason: default_single_reason(),
            default_bulk_reason: default_bulk_reason(),
            terminated_retention_seconds: default_retention(),
            purge_interval_seconds: default_purge_interval(),
        }
    }
}

fn default_max_concurrency() -> usize {
    8
}

fn default_batch_deadline() -> u64 {
    120
}

fn default_single_reason() -> String {
    "Admin-Terminated".to_string()
}

fn default_bulk_reason() -> String {
    "Bulk-Terminated".to_string()
}

fn default_retention() -> u64 {
    300
}

fn default_purge_interval() -> u64 {
    60
}
