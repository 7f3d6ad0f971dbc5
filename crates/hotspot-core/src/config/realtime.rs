//! Real-time event distribution configuration.

use serde::{Deserialize, Serialize};

/// Event broadcaster and WebSocket settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Per-subscriber mailbox size; overflowing subscribers lose their oldest events.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// Interval of the periodic `session_count_update`, in seconds.
    #[serde(default = "default_dashboard_interval")]
    pub dashboard_interval_seconds: u64,
    /// Interval of the periodic `router_health_update`, in seconds.
    #[serde(default = "default_router_health_interval")]
    pub router_health_interval_seconds: u64,
    /// WebSocket ping interval in seconds.
    #[serde(default = "default_ping_interval")]
    pub ping_interval_seconds: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: default_channel_buffer(),
            dashboard_interval_seconds: default_dashboard_interval(),
            router_health_interval_seconds: default_router_health_interval(),
            ping_interval_seconds: default_ping_interval(),
        }
    }
}

fn default_channel_buffer() -> usize {
    256
}

fn default_dashboard_interval() -> u64 {
    30
}

fn default_router_health_interval() -> u64 {
    60
}

fn default_ping_interval() -> u64 {
    30
}
