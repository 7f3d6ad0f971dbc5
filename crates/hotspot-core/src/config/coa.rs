//! RADIUS Change-of-Authorization (RFC 5176) client settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Disconnect-Request dispatch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoaConfig {
    /// Shared secret used to sign requests and verify replies.
    #[serde(default = "default_secret")]
    pub secret: String,
    /// Destination port used when a NAS identifier carries none.
    #[serde(default = "default_port")]
    pub default_port: u16,
    /// Local address the per-attempt sockets bind to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Time to wait for a reply to one attempt, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Additional attempts after the first one times out.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base backoff between attempts in milliseconds (multiplied by the attempt number).
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl CoaConfig {
    /// Per-attempt reply timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Backoff to sleep before the given (1-based) retry.
    pub fn backoff_for(&self, retry: u32) -> Duration {
        Duration::from_millis(self.backoff_ms.saturating_mul(u64::from(retry)))
    }

    /// Total number of attempts a timing-out request gets.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for CoaConfig {
    fn default() -> Self {
        Self {
            secret: default_secret(),
            default_port: default_port(),
            bind_address: default_bind_address(),
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

fn default_secret() -> String {
    "testing123".to_string()
}

fn default_port() -> u16 {
    3799
}

fn default_bind_address() -> String {
    "0.0.0.0:0".to_string()
}

fn default_timeout_ms() -> u64 {
    3000
}

fn default_max_retries() -> u32 {
    2
}

fn default_backoff_ms() -> u64 {
    250
}
