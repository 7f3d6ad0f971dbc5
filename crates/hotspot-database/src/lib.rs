//! # hotspot-database
//!
//! PostgreSQL connection management and the `radacct` repository that backs
//! the session registry.

pub mod connection;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::radacct::RadacctRepository;
