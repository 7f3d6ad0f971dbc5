//! Session identifier newtype.
//!
//! Access sessions are correlated by the RADIUS `Acct-Session-Id` that the
//! NAS assigns, which is an opaque string rather than a UUID. Wrapping it
//! keeps session ids from being mixed up with usernames or voucher codes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Maximum length of an `Acct-Session-Id` attribute value.
pub const MAX_SESSION_ID_LEN: usize = 253;

/// Stable identifier of a network access session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Create an identifier from a raw string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Return the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error returned when parsing an invalid session id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionIdError {
    /// The id was empty or only whitespace.
    #[error("session id must not be empty")]
    Empty,
    /// The id does not fit in a RADIUS attribute.
    #[error("session id exceeds {MAX_SESSION_ID_LEN} bytes")]
    TooLong,
}

impl FromStr for SessionId {
    type Err = SessionIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(SessionIdError::Empty);
        }
        if trimmed.len() > MAX_SESSION_ID_LEN {
            return Err(SessionIdError::TooLong);
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_whitespace() {
        let id: SessionId = "  80000012 ".parse().unwrap();
        assert_eq!(id.as_str(), "80000012");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!("   ".parse::<SessionId>(), Err(SessionIdError::Empty));
    }

    #[test]
    fn test_parse_rejects_oversized() {
        let raw = "x".repeat(MAX_SESSION_ID_LEN + 1);
        assert_eq!(raw.parse::<SessionId>(), Err(SessionIdError::TooLong));
    }

    #[test]
    fn test_serde_transparent() {
        let id = SessionId::new("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }
}
