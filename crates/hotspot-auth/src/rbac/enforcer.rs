//! RBAC enforcement: checks whether a role has a required permission.

use hotspot_core::error::AppError;
use hotspot_entity::user::OperatorRole;

use super::policies::{Permission, RbacPolicies};

/// Enforces role-based access control for session operations.
#[derive(Debug, Clone, Default)]
pub struct RbacEnforcer {
    policies: RbacPolicies,
}

impl RbacEnforcer {
    /// Creates an enforcer with the default policy set.
    pub fn new() -> Self {
        Self {
            policies: RbacPolicies::new(),
        }
    }

    /// Returns `Ok(())` if `role` holds `permission`, an authorization error otherwise.
    pub fn require_permission(
        &self,
        role: &OperatorRole,
        permission: &Permission,
    ) -> Result<(), AppError> {
        if self.policies.has_permission(role, permission) {
            Ok(())
        } else {
            Err(AppError::authorization(format!(
                "Role '{role}' does not have permission '{permission}'"
            )))
        }
    }

    /// Checks whether the role has the required permission (returns bool).
    pub fn has_permission(&self, role: &OperatorRole, permission: &Permission) -> bool {
        self.policies.has_permission(role, permission)
    }
}

#[cfg(test)]
mod tests {
    use hotspot_core::error::ErrorKind;

    use super::*;

    #[test]
    fn test_denial_is_authorization_error() {
        let rbac = RbacEnforcer::new();
        let err = rbac
            .require_permission(&OperatorRole::Technician, &Permission::SessionTerminate)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
        assert!(err.message.contains("session_terminate"));
        assert!(
            rbac.require_permission(&OperatorRole::Admin, &Permission::SessionTerminate)
                .is_ok()
        );
    }
}
