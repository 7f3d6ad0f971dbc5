//! Event and WebSocket control message definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hotspot_coa::NasHealth;
use hotspot_core::types::SessionId;
use hotspot_entity::session::{SessionState, SessionSummary};
use hotspot_entity::termination::TerminationOutcome;

/// Named event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    /// Per-session lifecycle changes.
    Sessions,
    /// Aggregated counters for the admin dashboard.
    Dashboard,
    /// NAS reachability.
    Routers,
}

impl Topic {
    /// Every topic, in a fixed order.
    pub const ALL: [Topic; 3] = [Topic::Sessions, Topic::Dashboard, Topic::Routers];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sessions => "sessions",
            Self::Dashboard => "dashboard",
            Self::Routers => "routers",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sessions" => Ok(Self::Sessions),
            "dashboard" => Ok(Self::Dashboard),
            "routers" => Ok(Self::Routers),
            other => Err(format!("Unknown topic: {other}")),
        }
    }
}

/// Session totals published on the dashboard topic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCounts {
    pub active: usize,
    pub termination_requested: usize,
    pub termination_failed: usize,
    pub terminated: usize,
    pub by_nas: BTreeMap<String, usize>,
}

/// Typed event body, serialized with a `type` tag.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum EventPayload {
    /// Reply to a client subscribe request.
    Subscribed { message: String },
    /// Reply to a client unsubscribe request.
    Unsubscribed { message: String },
    /// Client request could not be handled.
    Error { message: String },
    /// Reply to a client ping.
    Pong,
    /// An accounting start created a session.
    SessionCreated { session: SessionSummary },
    /// A session changed (usage, stop, state).
    SessionUpdate { session: SessionSummary },
    /// A dispatched termination finished.
    SessionTerminated {
        session_id: SessionId,
        state: SessionState,
        outcome: TerminationOutcome,
    },
    /// Current session totals; `active_sessions` counts every live session.
    SessionCountUpdate {
        active_sessions: usize,
        counts: SessionCounts,
    },
    /// Current NAS health.
    RouterHealthUpdate { data: Vec<NasHealth> },
}

/// An event as delivered to subscribers.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    /// Absent on replies that concern no topic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<Topic>,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl Event {
    pub fn new(topic: Topic, payload: EventPayload) -> Self {
        Self {
            topic: Some(topic),
            timestamp: Utc::now(),
            payload,
        }
    }

    /// A reply addressed to one client only.
    pub fn direct(payload: EventPayload) -> Self {
        Self {
            topic: None,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Serialize for a WebSocket text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Messages a WebSocket client may send.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe { topic: String },
    Unsubscribe { topic: String },
    Ping,
}
