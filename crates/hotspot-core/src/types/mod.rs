//! Shared domain value types.

pub mod id;

pub use id::SessionId;
