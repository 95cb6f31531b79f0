//! Auth read-model types
//!
//! Lightweight view of the directory rows owned by the directory domain.
//! Carries only the fields needed for authentication and authorization.

use mailroom_common::RoleName;
use serde::Serialize;
use uuid::Uuid;

/// Lightweight identity for authenticated users.
///
/// `role` is the caller's current role as stored right now, with a missing
/// assignment already resolved to civilian.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthIdentity {
    pub id: Uuid,
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: RoleName,
}
