//! Role-to-permission mapping definitions.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use hotspot_entity::user::OperatorRole;

/// Operation-level permission on the session control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// List and inspect active sessions, and subscribe to live events.
    SessionView,
    /// Disconnect sessions, singly or in bulk.
    SessionTerminate,
    /// Feed accounting start/interim/stop messages.
    AccountingIngest,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SessionView => "session_view",
            Self::SessionTerminate => "session_terminate",
            Self::AccountingIngest => "accounting_ingest",
        };
        f.write_str(name)
    }
}

/// Static role to permission table.
#[derive(Debug, Clone)]
pub struct RbacPolicies {
    grants: HashMap<OperatorRole, HashSet<Permission>>,
}

impl RbacPolicies {
    /// Default policy set.
    pub fn new() -> Self {
        use Permission::*;

        let mut grants = HashMap::new();
        grants.insert(
            OperatorRole::SuperAdmin,
            HashSet::from([SessionView, SessionTerminate, AccountingIngest]),
        );
        grants.insert(
            OperatorRole::Admin,
            HashSet::from([SessionView, SessionTerminate]),
        );
        grants.insert(OperatorRole::Technician, HashSet::from([SessionView]));
        grants.insert(OperatorRole::Accounting, HashSet::from([AccountingIngest]));

        Self { grants }
    }

    /// Whether `role` holds `permission`.
    pub fn has_permission(&self, role: &OperatorRole, permission: &Permission) -> bool {
        self.grants
            .get(role)
            .is_some_and(|granted| granted.contains(permission))
    }
}

impl Default for RbacPolicies {
    fn default() -> Self {
        Self::new()
    }
}
