//! Authorization context for authenticated callers

use mailroom_common::{has_permission, Error, Permission, Result, RoleName};
use uuid::Uuid;

use crate::types::AuthIdentity;

/// Explicit permission context passed into every admin operation
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: AuthIdentity,
}

impl AuthContext {
    /// Create new auth context for a user
    pub fn new(user: AuthIdentity) -> Self {
        Self { user }
    }

    pub fn user_id(&self) -> Uuid {
        self.user.id
    }

    /// Caller's role at authentication time
    pub fn role(&self) -> RoleName {
        self.user.role
    }

    /// Check if the caller holds `permission`
    pub fn has_permission(&self, permission: Permission) -> bool {
        has_permission(self.user.role, permission)
    }

    /// Fail with an authorization error unless the caller holds `permission`
    pub fn require(&self, permission: Permission) -> Result<()> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(Error::Authorization("Insufficient permission".to_string()))
        }
    }
}
