//! Per-session termination outcome.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hotspot_core::types::SessionId;

/// Why a termination attempt ended the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TerminationReason {
    /// Disconnect-ACK received.
    Ack,
    /// Disconnect-NAK received.
    Nak,
    /// No verified reply within the retry budget.
    Timeout,
    /// The NAS could not be resolved or the send failed.
    NasUnreachable,
    /// Another termination for the session was already in flight.
    AlreadyInProgress,
    /// The batch was cancelled before this session was dispatched.
    NotDispatched,
}

impl TerminationReason {
    /// Return the reason as its wire string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ack => "ACK",
            Self::Nak => "NAK",
            Self::Timeout => "TIMEOUT",
            Self::NasUnreachable => "NAS_UNREACHABLE",
            Self::AlreadyInProgress => "ALREADY_IN_PROGRESS",
            Self::NotDispatched => "NOT_DISPATCHED",
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one disconnect attempt sequence for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminationOutcome {
    /// Session the outcome belongs to.
    pub session_id: SessionId,
    /// `true` only for an acknowledged disconnect.
    pub succeeded: bool,
    /// Classification of the result.
    pub reason: TerminationReason,
    /// Number of Disconnect-Requests sent.
    pub attempts: u32,
    /// RFC 5176 Error-Cause carried by a NAK.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_cause: Option<u32>,
    /// When the outcome was decided.
    pub completed_at: DateTime<Utc>,
}

impl TerminationOutcome {
    /// The NAS acknowledged the disconnect.
    pub fn ack(session_id: SessionId, attempts: u32) -> Self {
        Self {
            session_id,
            succeeded: true,
            reason: TerminationReason::Ack,
            attempts,
            error_cause: None,
            completed_at: Utc::now(),
        }
    }

    /// The disconnect failed for `reason`.
    pub fn failed(
        session_id: SessionId,
        reason: TerminationReason,
        attempts: u32,
        error_cause: Option<u32>,
    ) -> Self {
        Self {
            session_id,
            succeeded: false,
            reason,
            attempts,
            error_cause,
            completed_at: Utc::now(),
        }
    }

    /// A termination for the session was already running; nothing was sent.
    pub fn duplicate(session_id: SessionId) -> Self {
        Self::failed(session_id, TerminationReason::AlreadyInProgress, 0, None)
    }

    /// The session was never dispatched because the batch stopped early.
    pub fn not_dispatched(session_id: SessionId) -> Self {
        Self::failed(session_id, TerminationReason::NotDispatched, 0, None)
    }

    /// Human-readable summary used in API messages.
    pub fn describe(&self) -> String {
        match self.reason {
            TerminationReason::Ack => format!("Session {} terminated", self.session_id),
            TerminationReason::Nak => match self.error_cause {
                Some(cause) => format!(
                    "NAS rejected disconnect for session {} (Error-Cause {cause})",
                    self.session_id
                ),
                None => format!("NAS rejected disconnect for session {}", self.session_id),
            },
            TerminationReason::Timeout => format!(
                "NAS did not answer disconnect for session {} after {} attempts",
                self.session_id, self.attempts
            ),
            TerminationReason::NasUnreachable => {
                format!("NAS for session {} is unreachable", self.session_id)
            }
            TerminationReason::AlreadyInProgress => format!(
                "Termination of session {} is already in progress",
                self.session_id
            ),
            TerminationReason::NotDispatched => format!(
                "Termination of session {} was cancelled before dispatch",
                self.session_id
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_ack_succeeds() {
        let id = SessionId::new("a");
        assert!(TerminationOutcome::ack(id.clone(), 1).succeeded);
        assert!(!TerminationOutcome::duplicate(id.clone()).succeeded);
        let nak = TerminationOutcome::failed(id, TerminationReason::Nak, 1, Some(503));
        assert!(!nak.succeeded);
        assert!(nak.describe().contains("503"));
    }

    #[test]
    fn test_reason_wire_format() {
        let json = serde_json::to_string(&TerminationReason::NasUnreachable).unwrap();
        assert_eq!(json, "\"NAS_UNREACHABLE\"");
        let outcome = TerminationOutcome::not_dispatched(SessionId::new("b"));
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["reason"], "NOT_DISPATCHED");
        assert_eq!(value["attempts"], 0);
        assert!(value.get("errorCause").is_none());
    }
}
