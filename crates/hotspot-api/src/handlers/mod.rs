//! Request handlers, one module per resource.

pub mod accounting;
pub mod health;
pub mod sessions;
pub mod ws;
