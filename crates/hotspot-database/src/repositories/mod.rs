//! Concrete repository implementations.

pub mod radacct;
