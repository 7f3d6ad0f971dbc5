//! JWT claims carried by operator access tokens.

use serde::{Deserialize, Serialize};

use hotspot_entity::user::OperatorRole;

/// Claims payload of an access token issued by the account service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject, the operator id.
    pub sub: String,
    /// Operator role at the time of issuance.
    pub role: OperatorRole,
    /// Display name, when the issuer includes one.
    #[serde(default)]
    pub username: Option<String>,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

impl Claims {
    /// Name to use in logs: the username when present, else the subject.
    pub fn actor(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.sub)
    }
}
