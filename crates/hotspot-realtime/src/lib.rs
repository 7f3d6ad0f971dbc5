//! # hotspot-realtime
//!
//! Live event distribution for administrative dashboards:
//!
//! - `broadcaster`: one bounded broadcast channel per topic; publishing
//!   never blocks and a slow subscriber loses its oldest events
//! - `event`: typed event payloads and the client control messages
//! - `monitor`: periodic session count and router health publishers
//! - `metrics`: publish/drop counters

pub mod broadcaster;
pub mod event;
pub mod metrics;
pub mod monitor;

pub use broadcaster::{EventBroadcaster, Subscription};
pub use event::{ClientMessage, Event, EventPayload, SessionCounts, Topic};
pub use metrics::{RealtimeMetrics, RealtimeMetricsSnapshot};
pub use monitor::{RouterHealthMonitor, SessionMonitor};
