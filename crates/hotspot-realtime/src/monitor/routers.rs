//! Router health publisher.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use hotspot_coa::NasHealthTracker;

use crate::broadcaster::EventBroadcaster;
use crate::event::{EventPayload, Topic};

/// Publishes `router_health_update` on the routers topic.
#[derive(Debug, Clone)]
pub struct RouterHealthMonitor {
    health: Arc<NasHealthTracker>,
    broadcaster: Arc<EventBroadcaster>,
}

impl RouterHealthMonitor {
    pub fn new(health: Arc<NasHealthTracker>, broadcaster: Arc<EventBroadcaster>) -> Self {
        Self {
            health,
            broadcaster,
        }
    }

    /// Publish the health of every known NAS.
    pub fn push_update(&self) -> usize {
        let data = self.health.snapshot();
        self.broadcaster
            .publish(Topic::Routers, EventPayload::RouterHealthUpdate { data })
    }

    /// Publish every `interval` until `cancel` fires.
    pub async fn run(self, interval: Duration, cancel: CancellationToken) {
        info!(interval_secs = interval.as_secs(), "Router health monitor started");
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let receivers = self.push_update();
                    debug!(receivers, "Router health published");
                }
            }
        }
        info!("Router health monitor stopped");
    }
}
