//! # hotspot-coa
//!
//! Client side of RADIUS Dynamic Authorization (RFC 5176) restricted to
//! Disconnect-Request. The [`CoaDispatcher`] turns a session snapshot into a
//! signed request, sends it to the session's NAS through a [`NasTransport`],
//! retries on timeout and classifies the result as a
//! [`TerminationOutcome`](hotspot_entity::termination::TerminationOutcome).
//! Network failures never surface as errors.

pub mod dispatcher;
pub mod health;
pub mod packet;
pub mod transport;

pub use dispatcher::CoaDispatcher;
pub use health::{NasHealth, NasHealthTracker, NasStatus};
pub use packet::{DisconnectRequest, EncodedRequest, PacketError, Reply, ReplyKind};
pub use transport::{NasTransport, TransportError, UdpNasTransport};
