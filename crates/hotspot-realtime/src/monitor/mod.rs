//! Periodic publishers for the dashboard and routers topics.

pub mod routers;
pub mod sessions;

pub use routers::RouterHealthMonitor;
pub use sessions::SessionMonitor;
