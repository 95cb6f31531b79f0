//! Role tiers and the permission predicate
//!
//! Roles are fixed reference data ordered `emperor > duke > knight > civilian`.
//! Only `emperor` holds [`Permission::ManageUsers`].

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// One of the four fixed role tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RoleName {
    Emperor,
    Duke,
    Knight,
    #[default]
    Civilian,
}

/// Permissions checked by the admin surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// List users, change quotas and roles, purge unverified accounts, read stats
    ManageUsers,
}

/// Error returned when a string does not name one of the four roles
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown role: {0}")]
pub struct ParseRoleError(pub String);

impl RoleName {
    /// All roles, highest tier first
    pub const ALL: [RoleName; 4] = [
        RoleName::Emperor,
        RoleName::Duke,
        RoleName::Knight,
        RoleName::Civilian,
    ];

    /// Roles that can be set through the promote/demote path
    pub const ASSIGNABLE: [RoleName; 3] = [RoleName::Duke, RoleName::Knight, RoleName::Civilian];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::Emperor => "emperor",
            RoleName::Duke => "duke",
            RoleName::Knight => "knight",
            RoleName::Civilian => "civilian",
        }
    }

    /// Human description stored alongside the role reference row
    #[mutants::skip] // Display text only
    pub fn description(&self) -> &'static str {
        match self {
            RoleName::Emperor => "Administrator; manages users, roles and quotas",
            RoleName::Duke => "Elevated verified member",
            RoleName::Knight => "Verified member",
            RoleName::Civilian => "Default unverified member",
        }
    }

    /// Label shown on the admin dashboard
    #[mutants::skip] // Display text only
    pub fn display_name(&self) -> &'static str {
        match self {
            RoleName::Emperor => "Emperor",
            RoleName::Duke => "Duke",
            RoleName::Knight => "Knight (verified)",
            RoleName::Civilian => "Civilian (unverified)",
        }
    }

    /// Whether this role may be set by an operator, as a promote target or
    /// as the site default role
    pub fn is_assignable(&self) -> bool {
        Self::ASSIGNABLE.contains(self)
    }

    /// Permissions granted to this role
    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            RoleName::Emperor => &[Permission::ManageUsers],
            RoleName::Duke | RoleName::Knight | RoleName::Civilian => &[],
        }
    }

    /// Resolve an optional stored assignment; no assignment means civilian.
    pub fn resolve(stored: Option<&str>) -> Result<Self, ParseRoleError> {
        match stored {
            Some(name) => name.parse(),
            None => Ok(RoleName::Civilian),
        }
    }
}

/// Pure permission predicate over the caller's current role.
pub fn has_permission(role: RoleName, permission: Permission) -> bool {
    role.permissions().contains(&permission)
}

impl FromStr for RoleName {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "emperor" => Ok(RoleName::Emperor),
            "duke" => Ok(RoleName::Duke),
            "knight" => Ok(RoleName::Knight),
            "civilian" => Ok(RoleName::Civilian),
            other => Err(ParseRoleError(other.to_string())),
        }
    }
}

impl std::fmt::Display for RoleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
