//! Role assignment and purge of unverified users

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use mailroom_auth::AuthContext;
use mailroom_common::{Error, Permission, RepositoryError, Result, RoleName};

use crate::domain::entities::parse_user_id;
use crate::repository::DirectoryStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleChangeStatus {
    Updated,
    /// The user already held the target role
    Unchanged,
}

/// Outcome of a promote/demote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleChange {
    pub user_id: Uuid,
    pub label: String,
    pub status: RoleChangeStatus,
    pub previous_role: RoleName,
    pub role: RoleName,
}

#[derive(Clone)]
pub struct RoleAssignmentService {
    directory: Arc<dyn DirectoryStore>,
}

impl RoleAssignmentService {
    pub fn new(directory: Arc<dyn DirectoryStore>) -> Self {
        Self { directory }
    }

    /// Set a user's role to duke, knight or civilian.
    pub async fn promote_user(
        &self,
        ctx: &AuthContext,
        user_id: &str,
        target_role: &str,
    ) -> Result<RoleChange> {
        ctx.require(Permission::ManageUsers)?;

        let role: RoleName = target_role
            .trim()
            .parse()
            .map_err(|_| Error::Validation(format!("Invalid role name: {}", target_role)))?;
        if !role.is_assignable() {
            return Err(Error::Validation(format!(
                "Role {} cannot be assigned",
                role
            )));
        }

        let not_found = || Error::NotFound("User not found".to_string());
        let id = parse_user_id(user_id).ok_or_else(not_found)?;
        let user = self.directory.find_user(id).await?.ok_or_else(not_found)?;

        if user.role == role {
            return Ok(RoleChange {
                user_id: id,
                label: user.display_label(),
                status: RoleChangeStatus::Unchanged,
                previous_role: role,
                role,
            });
        }

        self.directory
            .assign_role(id, role)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => {
                    Error::NotFound(format!("User or role {} not found", role))
                }
                other => other.into(),
            })?;

        tracing::info!(
            caller = %ctx.user_id(),
            user_id = %id,
            from = %user.role,
            to = %role,
            "Changed user role"
        );

        Ok(RoleChange {
            user_id: id,
            label: user.display_label(),
            status: RoleChangeStatus::Updated,
            previous_role: user.role,
            role,
        })
    }

    /// Delete every civilian, users without an assignment included.
    pub async fn delete_uncertified_users(&self, ctx: &AuthContext) -> Result<u64> {
        ctx.require(Permission::ManageUsers)?;

        if !self.directory.role_exists(RoleName::Civilian).await? {
            return Err(Error::NotFound("Civilian role not found".to_string()));
        }

        let deleted = self
            .directory
            .delete_users_with_role(RoleName::Civilian)
            .await?;

        tracing::warn!(caller = %ctx.user_id(), deleted, "Deleted uncertified users");
        Ok(deleted)
    }
}
