//! # hotspot-core
//!
//! Core crate for the hotspot session control service. Contains the
//! configuration schema, typed identifiers, and the unified error system.
//!
//! This crate has **no** internal dependencies on other hotspot crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
