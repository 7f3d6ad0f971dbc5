//! Access session entities.

pub mod accounting;
pub mod model;
pub mod state;

pub use accounting::{AccountingStatus, AccountingUpdate};
pub use model::{SessionRecord, SessionSummary};
pub use state::SessionState;
