//! Session count publisher.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use hotspot_session::SessionRegistry;

use crate::broadcaster::EventBroadcaster;
use crate::event::{EventPayload, SessionCounts, Topic};

/// Publishes `session_count_update` on the dashboard topic.
#[derive(Debug, Clone)]
pub struct SessionMonitor {
    registry: Arc<SessionRegistry>,
    broadcaster: Arc<EventBroadcaster>,
}

impl SessionMonitor {
    pub fn new(registry: Arc<SessionRegistry>, broadcaster: Arc<EventBroadcaster>) -> Self {
        Self {
            registry,
            broadcaster,
        }
    }

    /// Current totals.
    pub fn snapshot(&self) -> SessionCounts {
        let counts = self.registry.state_counts();
        SessionCounts {
            active: counts.active,
            termination_requested: counts.termination_requested,
            termination_failed: counts.termination_failed,
            terminated: counts.terminated,
            by_nas: self.registry.sessions_by_nas(),
        }
    }

    /// Publish the current totals.
    pub fn push_update(&self) -> usize {
        let counts = self.snapshot();
        let active_sessions =
            counts.active + counts.termination_requested + counts.termination_failed;
        self.broadcaster.publish(
            Topic::Dashboard,
            EventPayload::SessionCountUpdate {
                active_sessions,
                counts,
            },
        )
    }

    /// Publish totals every `interval` until `cancel` fires.
    pub async fn run(self, interval: Duration, cancel: CancellationToken) {
        info!(interval_secs = interval.as_secs(), "Session monitor started");
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let receivers = self.push_update();
                    debug!(receivers, "Session counts published");
                }
            }
        }
        info!("Session monitor stopped");
    }
}
