//! RADIUS Disconnect-Request / Disconnect-ACK / Disconnect-NAK wire format.
//!
//! ```text
//!  0                   1                   2                   3
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     Code      |  Identifier   |            Length             |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                  Authenticator (16 octets)                    |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |  Attributes (Type, Length, Value) ...
//! ```
//!
//! Request Authenticator = MD5(Code + Identifier + Length + 16 zero octets
//! + Attributes + Secret). Response Authenticator = MD5(Code + Identifier +
//! Length + Request Authenticator + Attributes + Secret).

use std::net::Ipv4Addr;

use bytes::{BufMut, Bytes, BytesMut};
use md5::{Digest, Md5};

/// Packet codes used by the disconnect exchange.
pub mod code {
    pub const DISCONNECT_REQUEST: u8 = 40;
    pub const DISCONNECT_ACK: u8 = 41;
    pub const DISCONNECT_NAK: u8 = 42;
}

/// Attribute types placed in or read from disconnect packets.
pub mod attr {
    pub const USER_NAME: u8 = 1;
    pub const NAS_IP_ADDRESS: u8 = 4;
    pub const FRAMED_IP_ADDRESS: u8 = 8;
    pub const ACCT_SESSION_ID: u8 = 44;
    pub const EVENT_TIMESTAMP: u8 = 55;
    pub const ERROR_CAUSE: u8 = 101;
}

/// Fixed header size.
pub const HEADER_LEN: usize = 20;
/// Largest packet RFC 2865 allows.
pub const MAX_PACKET_LEN: usize = 4096;
const MAX_ATTR_VALUE_LEN: usize = 253;
const AUTH_RANGE: std::ops::Range<usize> = 4..20;

/// Errors from encoding or validating a packet.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PacketError {
    #[error("attribute {kind} value of {len} bytes exceeds {MAX_ATTR_VALUE_LEN}")]
    AttributeTooLong { kind: u8, len: usize },
    #[error("packet exceeds {MAX_PACKET_LEN} bytes")]
    TooLarge,
    #[error("packet truncated at {0} bytes")]
    Truncated(usize),
    #[error("malformed attribute at offset {0}")]
    MalformedAttribute(usize),
    #[error("unexpected packet code {0}")]
    UnexpectedCode(u8),
    #[error("identifier {got} does not match request identifier {expected}")]
    IdentifierMismatch { expected: u8, got: u8 },
    #[error("authenticator does not verify")]
    BadAuthenticator,
}

/// One Type-Length-Value attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub kind: u8,
    pub value: Bytes,
}

/// Builder for a Disconnect-Request.
#[derive(Debug, Clone, Default)]
pub struct DisconnectRequest {
    identifier: u8,
    attributes: Vec<Attribute>,
}

impl DisconnectRequest {
    /// Start a request with the given RADIUS Identifier.
    pub fn new(identifier: u8) -> Self {
        Self {
            identifier,
            attributes: Vec::new(),
        }
    }

    /// Add a text attribute.
    pub fn string(mut self, kind: u8, value: &str) -> Self {
        self.attributes.push(Attribute {
            kind,
            value: Bytes::copy_from_slice(value.as_bytes()),
        });
        self
    }

    /// Add an IPv4 address attribute.
    pub fn ipv4(mut self, kind: u8, addr: Ipv4Addr) -> Self {
        self.attributes.push(Attribute {
            kind,
            value: Bytes::copy_from_slice(&addr.octets()),
        });
        self
    }

    /// Add a 32-bit integer attribute.
    pub fn integer(mut self, kind: u8, value: u32) -> Self {
        self.attributes.push(Attribute {
            kind,
            value: Bytes::copy_from_slice(&value.to_be_bytes()),
        });
        self
    }

    /// Serialize and sign the request.
    pub fn encode(&self, secret: &[u8]) -> Result<EncodedRequest, PacketError> {
        let mut buf = BytesMut::with_capacity(HEADER_LEN + 64);
        buf.put_u8(code::DISCONNECT_REQUEST);
        buf.put_u8(self.identifier);
        buf.put_u16(0);
        buf.put_slice(&[0u8; 16]);
        write_attributes(&mut buf, &self.attributes)?;
        set_length(&mut buf)?;

        let authenticator = md5_of(&[&buf[..], secret]);
        buf[AUTH_RANGE].copy_from_slice(&authenticator);

        Ok(EncodedRequest {
            identifier: self.identifier,
            authenticator,
            bytes: buf.freeze(),
        })
    }

    /// Parse and verify a request, as a NAS would on receipt.
    pub fn decode(datagram: &[u8], secret: &[u8]) -> Result<ParsedRequest, PacketError> {
        let packet = frame(datagram)?;
        if packet[0] != code::DISCONNECT_REQUEST {
            return Err(PacketError::UnexpectedCode(packet[0]));
        }
        let mut zeroed = packet.to_vec();
        zeroed[AUTH_RANGE].fill(0);
        let expected = md5_of(&[&zeroed[..], secret]);
        if packet[AUTH_RANGE] != expected {
            return Err(PacketError::BadAuthenticator);
        }
        Ok(ParsedRequest {
            identifier: packet[1],
            authenticator: expected,
            attributes: parse_attributes(&packet[HEADER_LEN..])?,
        })
    }
}

/// A signed request ready to send.
#[derive(Debug, Clone)]
pub struct EncodedRequest {
    pub identifier: u8,
    pub authenticator: [u8; 16],
    pub bytes: Bytes,
}

/// A verified Disconnect-Request as seen by the NAS.
#[derive(Debug, Clone)]
pub struct ParsedRequest {
    pub identifier: u8,
    pub authenticator: [u8; 16],
    pub attributes: Vec<Attribute>,
}

impl ParsedRequest {
    /// First value of an attribute type.
    pub fn attribute(&self, kind: u8) -> Option<&Bytes> {
        self.attributes
            .iter()
            .find(|a| a.kind == kind)
            .map(|a| &a.value)
    }

    /// First value of a text attribute.
    pub fn string(&self, kind: u8) -> Option<String> {
        self.attribute(kind)
            .map(|v| String::from_utf8_lossy(v).into_owned())
    }
}

/// Disconnect reply verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Ack,
    Nak,
}

/// A verified reply to one of our requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub kind: ReplyKind,
    pub identifier: u8,
    pub error_cause: Option<u32>,
}

impl Reply {
    /// Validate a datagram as the reply to `request`.
    ///
    /// Rejects anything that is not an ACK/NAK for the request's identifier
    /// with a Response Authenticator computed from its Request Authenticator.
    pub fn decode(
        datagram: &[u8],
        request: &EncodedRequest,
        secret: &[u8],
    ) -> Result<Self, PacketError> {
        let packet = frame(datagram)?;
        let kind = match packet[0] {
            code::DISCONNECT_ACK => ReplyKind::Ack,
            code::DISCONNECT_NAK => ReplyKind::Nak,
            other => return Err(PacketError::UnexpectedCode(other)),
        };
        if packet[1] != request.identifier {
            return Err(PacketError::IdentifierMismatch {
                expected: request.identifier,
                got: packet[1],
            });
        }
        let expected = md5_of(&[
            &packet[..4],
            &request.authenticator[..],
            &packet[HEADER_LEN..],
            secret,
        ]);
        if packet[AUTH_RANGE] != expected {
            return Err(PacketError::BadAuthenticator);
        }

        let error_cause = parse_attributes(&packet[HEADER_LEN..])?
            .into_iter()
            .find(|a| a.kind == attr::ERROR_CAUSE && a.value.len() == 4)
            .map(|a| u32::from_be_bytes([a.value[0], a.value[1], a.value[2], a.value[3]]));

        Ok(Self {
            kind,
            identifier: packet[1],
            error_cause,
        })
    }

    /// Serialize and sign this reply to a request with `request_authenticator`.
    pub fn encode(&self, request_authenticator: &[u8; 16], secret: &[u8]) -> Result<Bytes, PacketError> {
        let mut buf = BytesMut::with_capacity(HEADER_LEN + 6);
        buf.put_u8(match self.kind {
            ReplyKind::Ack => code::DISCONNECT_ACK,
            ReplyKind::Nak => code::DISCONNECT_NAK,
        });
        buf.put_u8(self.identifier);
        buf.put_u16(0);
        buf.put_slice(request_authenticator);
        if let Some(cause) = self.error_cause {
            write_attributes(
                &mut buf,
                &[Attribute {
                    kind: attr::ERROR_CAUSE,
                    value: Bytes::copy_from_slice(&cause.to_be_bytes()),
                }],
            )?;
        }
        set_length(&mut buf)?;

        let authenticator = md5_of(&[&buf[..], secret]);
        buf[AUTH_RANGE].copy_from_slice(&authenticator);
        Ok(buf.freeze())
    }
}

fn md5_of(parts: &[&[u8]]) -> [u8; 16] {
    let mut hasher = Md5::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

fn write_attributes(buf: &mut BytesMut, attributes: &[Attribute]) -> Result<(), PacketError> {
    for attribute in attributes {
        let len = attribute.value.len();
        if len > MAX_ATTR_VALUE_LEN {
            return Err(PacketError::AttributeTooLong {
                kind: attribute.kind,
                len,
            });
        }
        buf.put_u8(attribute.kind);
        buf.put_u8((len + 2) as u8);
        buf.put_slice(&attribute.value);
    }
    Ok(())
}

fn set_length(buf: &mut BytesMut) -> Result<(), PacketError> {
    if buf.len() > MAX_PACKET_LEN {
        return Err(PacketError::TooLarge);
    }
    let len = buf.len() as u16;
    buf[2..4].copy_from_slice(&len.to_be_bytes());
    Ok(())
}

/// Trim a datagram to its declared length; octets past it are padding.
fn frame(datagram: &[u8]) -> Result<&[u8], PacketError> {
    if datagram.len() < HEADER_LEN {
        return Err(PacketError::Truncated(datagram.len()));
    }
    let declared = usize::from(u16::from_be_bytes([datagram[2], datagram[3]]));
    if declared < HEADER_LEN || declared > datagram.len() || declared > MAX_PACKET_LEN {
        return Err(PacketError::Truncated(datagram.len()));
    }
    Ok(&datagram[..declared])
}

fn parse_attributes(mut raw: &[u8]) -> Result<Vec<Attribute>, PacketError> {
    let mut attributes = Vec::new();
    let mut offset = HEADER_LEN;
    while !raw.is_empty() {
        if raw.len() < 2 {
            return Err(PacketError::MalformedAttribute(offset));
        }
        let len = usize::from(raw[1]);
        if len < 2 || len > raw.len() {
            return Err(PacketError::MalformedAttribute(offset));
        }
        attributes.push(Attribute {
            kind: raw[0],
            value: Bytes::copy_from_slice(&raw[2..len]),
        });
        raw = &raw[len..];
        offset += len;
    }
    Ok(attributes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"testing123";

    fn request() -> EncodedRequest {
        DisconnectRequest::new(7)
            .string(attr::ACCT_SESSION_ID, "81000001")
            .string(attr::USER_NAME, "0712_ABC")
            .ipv4(attr::NAS_IP_ADDRESS, Ipv4Addr::new(10, 0, 0, 1))
            .integer(attr::EVENT_TIMESTAMP, 1_700_000_000)
            .encode(SECRET)
            .unwrap()
    }

    #[test]
    fn test_request_layout() {
        let req = request();
        let bytes = &req.bytes;
        assert_eq!(bytes[0], code::DISCONNECT_REQUEST);
        assert_eq!(bytes[1], 7);
        assert_eq!(usize::from(u16::from_be_bytes([bytes[2], bytes[3]])), bytes.len());
        // 20 header + (2+8) + (2+8) + (2+4) + (2+4)
        assert_eq!(bytes.len(), 52);
        assert_eq!(&bytes[4..20], &req.authenticator);
    }

    #[test]
    fn test_request_authenticator_matches_rfc_formula() {
        let req = request();
        let mut zeroed = req.bytes.to_vec();
        zeroed[4..20].fill(0);
        let mut hasher = Md5::new();
        hasher.update(&zeroed);
        hasher.update(SECRET);
        let expected: [u8; 16] = hasher.finalize().into();
        assert_eq!(req.authenticator, expected);
    }

    #[test]
    fn test_nas_side_decode_checks_secret() {
        let req = request();
        let parsed = DisconnectRequest::decode(&req.bytes, SECRET).unwrap();
        assert_eq!(parsed.identifier, 7);
        assert_eq!(parsed.string(attr::ACCT_SESSION_ID).as_deref(), Some("81000001"));
        assert_eq!(
            parsed.attribute(attr::NAS_IP_ADDRESS).map(|v| v.to_vec()),
            Some(vec![10, 0, 0, 1])
        );
        assert_eq!(
            DisconnectRequest::decode(&req.bytes, b"wrong").unwrap_err(),
            PacketError::BadAuthenticator
        );
    }

    #[test]
    fn test_nak_with_error_cause_verifies() {
        let req = request();
        let nak = Reply {
            kind: ReplyKind::Nak,
            identifier: 7,
            error_cause: Some(503),
        };
        let wire = nak.encode(&req.authenticator, SECRET).unwrap();
        assert_eq!(Reply::decode(&wire, &req, SECRET).unwrap(), nak);
    }

    #[test]
    fn test_reply_with_wrong_identifier_rejected() {
        let req = request();
        let ack = Reply {
            kind: ReplyKind::Ack,
            identifier: 8,
            error_cause: None,
        };
        let wire = ack.encode(&req.authenticator, SECRET).unwrap();
        assert_eq!(
            Reply::decode(&wire, &req, SECRET).unwrap_err(),
            PacketError::IdentifierMismatch { expected: 7, got: 8 }
        );
    }

    #[test]
    fn test_reply_signed_for_other_request_rejected() {
        let req = request();
        let ack = Reply {
            kind: ReplyKind::Ack,
            identifier: 7,
            error_cause: None,
        };
        let wire = ack.encode(&[0xAB; 16], SECRET).unwrap();
        assert_eq!(
            Reply::decode(&wire, &req, SECRET).unwrap_err(),
            PacketError::BadAuthenticator
        );
    }

    #[test]
    fn test_truncated_and_malformed_input() {
        let req = request();
        assert_eq!(
            Reply::decode(&[41, 7, 0], &req, SECRET).unwrap_err(),
            PacketError::Truncated(3)
        );
        let mut bad = vec![41, 7, 0, 23];
        bad.extend_from_slice(&[0; 16]);
        bad.extend_from_slice(&[101, 9, 0]);
        assert!(parse_attributes(&bad[20..]).is_err());
    }

    #[test]
    fn test_oversized_attribute_rejected() {
        let long = "x".repeat(254);
        let err = DisconnectRequest::new(1)
            .string(attr::USER_NAME, &long)
            .encode(SECRET)
            .unwrap_err();
        assert_eq!(err, PacketError::AttributeTooLong { kind: 1, len: 254 });
    }
}
