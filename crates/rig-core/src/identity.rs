use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::OperatorRef;
use crate::enums::Role;
use crate::errors::CoreError;

/// The authenticated user acting on the store.
///
/// Produced by the auth collaborator; this crate only consumes it.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Actor {
    pub name: String,
    pub badge_id: String,
    pub role: Role,
}

impl Actor {
    #[must_use]
    pub fn new(name: impl Into<String>, badge_id: impl Into<String>, role: Role) -> Self {
        Self {
            name: name.into(),
            badge_id: badge_id.into(),
            role,
        }
    }

    #[must_use]
    pub fn operator_ref(&self) -> OperatorRef {
        OperatorRef {
            name: self.name.clone(),
            badge_id: self.badge_id.clone(),
        }
    }
}

/// Role-to-permission decisions consumed by the store.
pub trait AccessPolicy: Send + Sync {
    fn can_review(&self, role: Role) -> bool;
    fn can_override_equipment_status(&self, role: Role) -> bool;
    fn can_erase(&self, role: Role) -> bool;
    /// Whether the role sees every operator's records, not only its own.
    fn sees_all_records(&self, role: Role) -> bool;
}

/// Default policy: operators submit and see their own records, supervisors
/// review, maintenance may override equipment status, admins do everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct RolePolicy;

impl AccessPolicy for RolePolicy {
    fn can_review(&self, role: Role) -> bool {
        matches!(role, Role::Supervisor | Role::Admin)
    }

    fn can_override_equipment_status(&self, role: Role) -> bool {
        matches!(role, Role::Supervisor | Role::Maintenance | Role::Admin)
    }

    fn can_erase(&self, role: Role) -> bool {
        matches!(role, Role::Admin)
    }

    fn sees_all_records(&self, role: Role) -> bool {
        !matches!(role, Role::Operator)
    }
}

/// Fail with `PermissionDenied` unless `allowed` holds.
///
/// # Errors
///
/// Returns `CoreError::PermissionDenied` naming the role and action.
pub fn ensure(allowed: bool, actor: &Actor, action: &str) -> Result<(), CoreError> {
    if allowed {
        Ok(())
    } else {
        Err(CoreError::PermissionDenied {
            role: actor.role.to_string(),
            action: action.to_string(),
        })
    }
}
