//! # hotspot-entity
//!
//! Domain models for the hotspot session control service. Every struct in
//! this crate is a value object: session records are owned by the session
//! registry and handed out as snapshots, termination outcomes are transient
//! results, and roles come from the verified bearer token.

pub mod session;
pub mod termination;
pub mod user;
