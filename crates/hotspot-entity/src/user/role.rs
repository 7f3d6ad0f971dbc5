//! Operator role claimed by the bearer token.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role of the caller as issued by the account service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorRole {
    /// Full administrative access.
    SuperAdmin,
    /// Day-to-day administration.
    Admin,
    /// Field technician; read-only on sessions.
    Technician,
    /// Service account of the accounting bridge.
    Accounting,
}

impl OperatorRole {
    /// Return the role as its claim string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::Technician => "technician",
            Self::Accounting => "accounting",
        }
    }
}

impl fmt::Display for OperatorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperatorRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "technician" => Ok(Self::Technician),
            "accounting" => Ok(Self::Accounting),
            other => Err(format!("Unknown operator role: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("SUPER_ADMIN".parse::<OperatorRole>(), Ok(OperatorRole::SuperAdmin));
        assert!("customer".parse::<OperatorRole>().is_err());
    }
}
