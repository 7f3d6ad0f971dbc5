//! Disconnect dispatcher: one session, one outcome.

use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use chrono::Utc;
use tracing::{debug, error, info, warn};

use hotspot_core::config::CoaConfig;
use hotspot_entity::session::SessionRecord;
use hotspot_entity::termination::{TerminationOutcome, TerminationReason};

use crate::health::NasHealthTracker;
use crate::packet::{DisconnectRequest, EncodedRequest, PacketError, ReplyKind, attr};
use crate::transport::{NasTransport, UdpNasTransport};

/// Sends Disconnect-Requests and classifies the result.
///
/// Every attempt carries a fresh Identifier and Event-Timestamp and goes out
/// on a fresh socket, so a late reply to an earlier attempt cannot be
/// mistaken for a reply to the current one.
#[derive(Debug)]
pub struct CoaDispatcher {
    config: CoaConfig,
    secret: Vec<u8>,
    transport: Arc<dyn NasTransport>,
    next_identifier: AtomicU8,
    health: Arc<NasHealthTracker>,
}

impl CoaDispatcher {
    /// Create a dispatcher over an arbitrary transport.
    pub fn new(config: CoaConfig, transport: Arc<dyn NasTransport>) -> Self {
        Self {
            secret: config.secret.as_bytes().to_vec(),
            config,
            transport,
            next_identifier: AtomicU8::new(0),
            health: Arc::new(NasHealthTracker::new()),
        }
    }

    /// Create a dispatcher that talks UDP to real NAS devices.
    pub fn udp(config: CoaConfig) -> Self {
        let transport = UdpNasTransport::new(
            config.secret.as_bytes(),
            config.default_port,
            &config.bind_address,
        );
        Self::new(config, Arc::new(transport))
    }

    /// Per-NAS health collected from outcomes.
    pub fn health(&self) -> &Arc<NasHealthTracker> {
        &self.health
    }

    /// Disconnect `record` from its NAS.
    ///
    /// Never fails: timeouts, rejections and transport errors are all
    /// reported through the returned outcome.
    pub async fn disconnect(&self, record: &SessionRecord, reason: &str) -> TerminationOutcome {
        let outcome = self.attempt_all(record).await;
        self.health.record(&record.nas_identifier, &outcome);

        if outcome.succeeded {
            info!(
                session_id = %record.session_id,
                nas = %record.nas_identifier,
                attempts = outcome.attempts,
                reason,
                "Session disconnected"
            );
        } else {
            warn!(
                session_id = %record.session_id,
                nas = %record.nas_identifier,
                attempts = outcome.attempts,
                result = %outcome.reason,
                error_cause = ?outcome.error_cause,
                reason,
                "Session disconnect failed"
            );
        }
        outcome
    }

    async fn attempt_all(&self, record: &SessionRecord) -> TerminationOutcome {
        let session_id = record.session_id.clone();
        let max_attempts = self.config.max_attempts();
        let timeout = self.config.timeout();

        // One lookup per dispatch; failing or outliving `timeout` is NAS_UNREACHABLE.
        let lookup = self.transport.resolve(&record.nas_identifier);
        let remote = match tokio::time::timeout(timeout, lookup).await {
            Ok(Ok(remote)) => remote,
            Ok(Err(e)) => {
                debug!(session_id = %session_id, error = %e, "NAS address lookup failed");
                return TerminationOutcome::failed(
                    session_id,
                    TerminationReason::NasUnreachable,
                    0,
                    None,
                );
            }
            Err(_) => {
                debug!(
                    session_id = %session_id,
                    nas = %record.nas_identifier,
                    "NAS address lookup timed out"
                );
                return TerminationOutcome::failed(
                    session_id,
                    TerminationReason::NasUnreachable,
                    0,
                    None,
                );
            }
        };

        let mut attempt = 0;

        loop {
            attempt += 1;
            let request = match self.build_request(record) {
                Ok(request) => request,
                Err(e) => {
                    error!(session_id = %session_id, error = %e, "Cannot encode Disconnect-Request");
                    return TerminationOutcome::failed(
                        session_id,
                        TerminationReason::NasUnreachable,
                        attempt - 1,
                        None,
                    );
                }
            };

            let exchange = self.transport.exchange(remote, &request);
            match tokio::time::timeout(timeout, exchange).await {
                Ok(Ok(reply)) => {
                    return match reply.kind {
                        ReplyKind::Ack => TerminationOutcome::ack(session_id, attempt),
                        ReplyKind::Nak => TerminationOutcome::failed(
                            session_id,
                            TerminationReason::Nak,
                            attempt,
                            reply.error_cause,
                        ),
                    };
                }
                Ok(Err(e)) => {
                    debug!(session_id = %session_id, error = %e, "NAS unreachable");
                    return TerminationOutcome::failed(
                        session_id,
                        TerminationReason::NasUnreachable,
                        attempt,
                        None,
                    );
                }
                Err(_) if attempt >= max_attempts => {
                    return TerminationOutcome::failed(
                        session_id,
                        TerminationReason::Timeout,
                        attempt,
                        None,
                    );
                }
                Err(_) => {
                    let backoff = self.config.backoff_for(attempt);
                    debug!(
                        session_id = %session_id,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        "Disconnect-Request timed out, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    fn build_request(&self, record: &SessionRecord) -> Result<EncodedRequest, PacketError> {
        let identifier = self.next_identifier.fetch_add(1, Ordering::Relaxed);
        let mut request = DisconnectRequest::new(identifier)
            .string(attr::ACCT_SESSION_ID, record.session_id.as_str());
        if !record.username.is_empty() {
            request = request.string(attr::USER_NAME, &record.username);
        }
        if let Some(ip) = nas_ipv4(&record.nas_identifier) {
            request = request.ipv4(attr::NAS_IP_ADDRESS, ip);
        }
        if let Some(ip) = record.framed_ip.as_deref().and_then(|ip| ip.parse().ok()) {
            request = request.ipv4(attr::FRAMED_IP_ADDRESS, ip);
        }
        let now = u32::try_from(Utc::now().timestamp()).unwrap_or(0);
        request.integer(attr::EVENT_TIMESTAMP, now).encode(&self.secret)
    }
}

/// IPv4 literal of a `host` or `host:port` NAS identifier.
fn nas_ipv4(nas_identifier: &str) -> Option<Ipv4Addr> {
    nas_identifier
        .parse::<SocketAddrV4>()
        .map(|addr| *addr.ip())
        .or_else(|_| nas_identifier.parse::<Ipv4Addr>())
        .ok()
}
