//! # hotspot-session
//!
//! Authoritative in-memory view of the access sessions the hotspot is
//! currently enforcing. The [`SessionRegistry`] is the only owner of
//! [`SessionRecord`](hotspot_entity::session::SessionRecord)s; callers get
//! cloned snapshots. Termination state changes go through a per-record
//! compare-and-swap so that at most one Disconnect-Request is in flight per
//! session.
//!
//! The [`SessionStore`] trait is the persistence seam used to rebuild the
//! registry on start-up and to record terminations.

pub mod entry;
pub mod registry;
pub mod store;

pub use registry::{InsertOutcome, SessionRegistry, StateCounts};
pub use store::{MemorySessionStore, SessionStore};
