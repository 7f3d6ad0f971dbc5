//! Session termination state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of an access session as seen by the termination core.
///
/// ```text
/// ACTIVE ──begin──▶ TERMINATION_REQUESTED ──ack──▶ TERMINATED
///   ▲                    │        │
///   └──── release ───────┘        └──fail──▶ TERMINATION_FAILED ──begin──▶ …
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum SessionState {
    /// The NAS is enforcing the session.
    Active = 0,
    /// A Disconnect-Request is in flight.
    TerminationRequested = 1,
    /// The NAS acknowledged the disconnect.
    Terminated = 2,
    /// The last disconnect attempt failed; the session may be retried.
    TerminationFailed = 3,
}

impl SessionState {
    /// Compact representation stored in the registry's atomic state cell.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Inverse of [`SessionState::as_u8`].
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Active),
            1 => Some(Self::TerminationRequested),
            2 => Some(Self::Terminated),
            3 => Some(Self::TerminationFailed),
            _ => None,
        }
    }

    /// Whether a new termination may start from this state.
    pub fn can_begin_termination(self) -> bool {
        matches!(self, Self::Active | Self::TerminationFailed)
    }

    /// Whether the session still counts as live on the NAS.
    pub fn is_live(self) -> bool {
        !matches!(self, Self::Terminated)
    }

    /// Return the state as its wire string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::TerminationRequested => "TERMINATION_REQUESTED",
            Self::Terminated => "TERMINATED",
            Self::TerminationFailed => "TERMINATION_FAILED",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u8_roundtrip_covers_all_states() {
        for state in [
            SessionState::Active,
            SessionState::TerminationRequested,
            SessionState::Terminated,
            SessionState::TerminationFailed,
        ] {
            assert_eq!(SessionState::from_u8(state.as_u8()), Some(state));
        }
        assert_eq!(SessionState::from_u8(9), None);
    }

    #[test]
    fn test_begin_allowed_only_from_active_or_failed() {
        assert!(SessionState::Active.can_begin_termination());
        assert!(SessionState::TerminationFailed.can_begin_termination());
        assert!(!SessionState::TerminationRequested.can_begin_termination());
        assert!(!SessionState::Terminated.can_begin_termination());
    }
}
