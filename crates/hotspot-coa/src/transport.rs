//! Transport seam between the dispatcher and a NAS.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use async_trait::async_trait;
use tokio::net::{UdpSocket, lookup_host};
use tracing::{debug, warn};

use crate::packet::{EncodedRequest, MAX_PACKET_LEN, Reply};

/// Transport-level failure of one exchange.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The NAS address could not be resolved.
    #[error("cannot resolve NAS '{nas}': {reason}")]
    Resolve { nas: String, reason: String },
    /// Binding, sending or receiving failed.
    #[error("I/O error talking to NAS '{nas}': {reason}")]
    Io { nas: String, reason: String },
}

/// Resolves NAS addresses and exchanges signed requests with them.
///
/// `exchange` keeps waiting until a reply that matches the request arrives;
/// the caller bounds both the lookup and the wait.
#[async_trait]
pub trait NasTransport: Send + Sync + std::fmt::Debug {
    /// Resolve a NAS identifier to the address requests are sent to.
    async fn resolve(&self, nas_identifier: &str) -> Result<SocketAddr, TransportError>;

    /// Send one request to `remote` and wait for its verified reply.
    async fn exchange(
        &self,
        remote: SocketAddr,
        request: &EncodedRequest,
    ) -> Result<Reply, TransportError>;
}

/// UDP transport using a fresh ephemeral socket per exchange.
#[derive(Debug, Clone)]
pub struct UdpNasTransport {
    secret: Vec<u8>,
    default_port: u16,
    bind_address: SocketAddr,
}

impl UdpNasTransport {
    /// Create a transport. An unparsable bind address falls back to the
    /// unspecified IPv4 address on an ephemeral port.
    pub fn new(secret: impl Into<Vec<u8>>, default_port: u16, bind_address: &str) -> Self {
        let bind_address = bind_address.parse().unwrap_or_else(|_| {
            warn!(bind_address, "Invalid CoA bind address, using 0.0.0.0:0");
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        });
        Self {
            secret: secret.into(),
            default_port,
            bind_address,
        }
    }

    fn local_address_for(&self, remote: &SocketAddr) -> SocketAddr {
        match (remote, self.bind_address) {
            (SocketAddr::V6(_), SocketAddr::V4(_)) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
            (SocketAddr::V4(_), SocketAddr::V6(_)) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            _ => self.bind_address,
        }
    }
}

#[async_trait]
impl NasTransport for UdpNasTransport {
    /// Accepts `host`, `host:port`, `ip` or `ip:port`.
    async fn resolve(&self, nas_identifier: &str) -> Result<SocketAddr, TransportError> {
        let nas = nas_identifier.trim();
        if let Ok(addr) = nas.parse::<SocketAddr>() {
            return Ok(addr);
        }
        if let Ok(ip) = nas.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.default_port));
        }
        let target = if nas.contains(':') {
            nas.to_string()
        } else {
            format!("{nas}:{}", self.default_port)
        };
        let resolve_error = |reason: String| TransportError::Resolve {
            nas: nas_identifier.to_string(),
            reason,
        };
        lookup_host(target)
            .await
            .map_err(|e| resolve_error(e.to_string()))?
            .next()
            .ok_or_else(|| resolve_error("no addresses".to_string()))
    }

    async fn exchange(
        &self,
        remote: SocketAddr,
        request: &EncodedRequest,
    ) -> Result<Reply, TransportError> {
        let io_error = |e: std::io::Error| TransportError::Io {
            nas: remote.to_string(),
            reason: e.to_string(),
        };

        let socket = UdpSocket::bind(self.local_address_for(&remote))
            .await
            .map_err(io_error)?;
        socket.connect(remote).await.map_err(io_error)?;
        socket.send(&request.bytes).await.map_err(io_error)?;
        debug!(
            nas = %remote,
            identifier = request.identifier,
            "Disconnect-Request sent"
        );

        let mut buf = vec![0u8; MAX_PACKET_LEN];
        loop {
            let len = socket.recv(&mut buf).await.map_err(io_error)?;
            match Reply::decode(&buf[..len], request, &self.secret) {
                Ok(reply) => return Ok(reply),
                Err(e) => {
                    warn!(nas = %remote, error = %e, "Ignoring unverifiable CoA reply");
                }
            }
        }
    }
}
