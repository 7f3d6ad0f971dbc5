//! # hotspot-service
//!
//! Operations behind the administrative API. Services check the caller's
//! permission, act on the session registry and publish the resulting
//! events.
//!
//! - `context`: the authenticated caller
//! - `session::service`: listing and lookup
//! - `session::accounting`: accounting feed ingestion
//! - `session::termination`: single and bulk termination
//! - `session::maintenance`: start-up rebuild and terminated-session purge

pub mod context;
pub mod session;

pub use context::RequestContext;
pub use session::{
    AccountingAction, AccountingService, SessionMaintenance, SessionService, TerminationService,
};
