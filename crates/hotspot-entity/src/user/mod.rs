//! Operator identity.

pub mod role;

pub use role::OperatorRole;
