//! Realtime metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Event distribution counters.
#[derive(Debug, Default)]
pub struct RealtimeMetrics {
    /// Events handed to a topic channel
    pub events_published: AtomicU64,
    /// Events lost by lagging subscribers
    pub events_dropped: AtomicU64,
    /// Subscribe operations
    pub subscriptions_total: AtomicU64,
    /// Open WebSocket connections
    pub connections_active: AtomicU64,
}

impl RealtimeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_published(&self) {
        self.events_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self, count: u64) {
        self.events_dropped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_subscription(&self) {
        self.subscriptions_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_opened(&self) {
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        // Saturate rather than wrap if a close is ever double-counted.
        let _ = self
            .connections_active
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> RealtimeMetricsSnapshot {
        RealtimeMetricsSnapshot {
            events_published: self.events_published.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            subscriptions_total: self.subscriptions_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeMetricsSnapshot {
    pub events_published: u64,
    pub events_dropped: u64,
    pub subscriptions_total: u64,
    pub connections_active: u64,
}
