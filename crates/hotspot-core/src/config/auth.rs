//! Bearer token verification settings.

use serde::{Deserialize, Serialize};

/// Settings for verifying tokens issued by the account service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared HS256 secret. Must be overridden outside development.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Clock skew tolerance in seconds.
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,
    /// Expected `iss` claim; not checked when empty.
    #[serde(default)]
    pub issuer: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            leeway_seconds: default_leeway(),
            issuer: String::new(),
        }
    }
}

fn default_jwt_secret() -> String {
    "dev-only-change-me".to_string()
}

fn default_leeway() -> u64 {
    5
}
