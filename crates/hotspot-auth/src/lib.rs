//! # hotspot-auth
//!
//! Verification of the bearer tokens issued by the account service and
//! role-based access control over session operations.
//!
//! ## Modules
//!
//! - `jwt`: HS256 token validation and claims
//! - `rbac`: role to permission policies and enforcement

pub mod jwt;
pub mod rbac;

pub use jwt::{Claims, JwtDecoder};
pub use rbac::{Permission, RbacEnforcer, RbacPolicies};
