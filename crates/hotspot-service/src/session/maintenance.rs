//! Registry rebuild and terminated-session archival.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use hotspot_core::result::AppResult;
use hotspot_realtime::SessionMonitor;
use hotspot_session::{SessionRegistry, SessionStore};

/// Background upkeep of the session registry.
#[derive(Debug, Clone)]
pub struct SessionMaintenance {
    registry: Arc<SessionRegistry>,
    store: Arc<dyn SessionStore>,
    monitor: SessionMonitor,
}

impl SessionMaintenance {
    pub fn new(
        registry: Arc<SessionRegistry>,
        store: Arc<dyn SessionStore>,
        monitor: SessionMonitor,
    ) -> Self {
        Self {
            registry,
            store,
            monitor,
        }
    }

    /// Rebuild the registry from the sessions the store still has open.
    ///
    /// Every restored session starts out `ACTIVE`; terminations that were in
    /// flight when the process stopped are not resumed.
    pub async fn restore(&self) -> AppResult<usize> {
        let open = self.store.load_open_sessions().await?;
        let restored = self.registry.replace_all(open);
        info!(restored, "Session registry rebuilt from store");
        self.monitor.push_update();
        Ok(restored)
    }

    /// Drop terminated sessions older than `retention`.
    pub fn purge(&self, retention: Duration) -> usize {
        let retention = chrono::Duration::from_std(retention).unwrap_or(chrono::Duration::MAX);
        let purged = self.registry.purge_terminated(retention);
        if !purged.is_empty() {
            debug!(count = purged.len(), "Terminated sessions archived");
            self.monitor.push_update();
        }
        purged.len()
    }

    /// Purge every `interval` until `cancel` fires.
    pub async fn run_purge(self, retention: Duration, interval: Duration, cancel: CancellationToken) {
        info!(
            retention_secs = retention.as_secs(),
            interval_secs = interval.as_secs(),
            "Terminated session purge started"
        );
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.purge(retention);
                }
            }
        }
        info!("Terminated session purge stopped");
    }
}
