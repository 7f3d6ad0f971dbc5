//! Request context carrying the authenticated operator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hotspot_entity::user::OperatorRole;

/// The authenticated caller of a service operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// Operator id (token subject).
    pub operator_id: String,
    /// Operator role at the time the token was issued.
    pub role: OperatorRole,
    /// Name used in logs.
    pub username: String,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    pub fn new(operator_id: impl Into<String>, role: OperatorRole, username: impl Into<String>) -> Self {
        Self {
            operator_id: operator_id.into(),
            role,
            username: username.into(),
            request_time: Utc::now(),
        }
    }
}
