//! Termination outcome entities.

pub mod outcome;
pub mod report;

pub use outcome::{TerminationOutcome, TerminationReason};
pub use report::{BulkStatus, BulkTerminationReport};
