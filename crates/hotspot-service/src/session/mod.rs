//! Session operations.

pub mod accounting;
pub mod maintenance;
pub mod service;
pub mod termination;

pub use accounting::{AccountingAction, AccountingService};
pub use maintenance::SessionMaintenance;
pub use service::SessionService;
pub use termination::TerminationService;
