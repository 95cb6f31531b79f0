//! Domain entities for the Mailroom directory
//!
//! Users are owned by registration; this domain only reads them, adjusts their
//! quota and role assignment, and deletes unverified ones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::ValidateEmail;

use mailroom_auth::AuthIdentity;
use mailroom_common::{Error, Result, RoleName};

use crate::domain::quota::QuotaPolicy;

/// A directory user joined with its effective role
///
/// `role` is `Civilian` when the user has no assignment row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryUser {
    pub id: Uuid,
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub max_emails: i32,
    pub created_at: Option<DateTime<Utc>>,
    pub role: RoleName,
}

impl DirectoryUser {
    /// Label used in operator-facing messages: username, then email, then id
    pub fn display_label(&self) -> String {
        self.username
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.email.as_deref().filter(|s| !s.is_empty()))
            .map(str::to_string)
            .unwrap_or_else(|| self.id.to_string())
    }

    /// Case-insensitive substring match on name, username or email
    pub fn matches_search(&self, needle_lower: &str) -> bool {
        [&self.name, &self.username, &self.email]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(needle_lower))
    }
}

impl From<DirectoryUser> for AuthIdentity {
    fn from(user: DirectoryUser) -> Self {
        AuthIdentity {
            id: user.id,
            name: user.name,
            username: user.username,
            email: user.email,
            role: user.role,
        }
    }
}

/// Row of the user listing, with the lifetime mailbox count attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListItem {
    pub id: Uuid,
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: RoleName,
    pub max_emails: i32,
    pub current_email_count: i64,
    pub created_at: Option<DateTime<Utc>>,
}

impl UserListItem {
    pub fn from_user(user: DirectoryUser, current_email_count: i64) -> Self {
        Self {
            id: user.id,
            name: user.name,
            username: user.username,
            email: user.email,
            role: user.role,
            max_emails: user.max_emails,
            current_email_count,
            created_at: user.created_at,
        }
    }
}

/// A temporary mailbox owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mailbox {
    pub id: Uuid,
    pub address: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Mailbox {
    pub fn new(owner_id: Uuid, address: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            address: address.into(),
            owner_id,
            created_at: Utc::now(),
            expires_at,
        }
    }

    /// Still active at `at` (expiry strictly in the future)
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.expires_at > at
    }
}

/// One bucket of the quota distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct QuotaBucket {
    pub max_emails: i32,
    pub user_count: i64,
}

/// A user about to be inserted
///
/// Carries the quota policy it was built under; every store checks
/// [`NewUser::validate`] before writing the row.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub id: Uuid,
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub max_emails: i32,
    pub created_at: Option<DateTime<Utc>>,
    policy: QuotaPolicy,
}

impl NewUser {
    /// Fresh user carrying the policy default quota
    pub fn new(policy: &QuotaPolicy) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: None,
            username: None,
            email: None,
            max_emails: policy.default_max_emails(),
            created_at: Some(Utc::now()),
            policy: *policy,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_max_emails(mut self, max_emails: i32) -> Self {
        self.max_emails = max_emails;
        self
    }

    pub fn with_created_at(mut self, created_at: Option<DateTime<Utc>>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Check the row invariants before insert
    pub fn validate(&self) -> Result<()> {
        if let Some(ref email) = self.email {
            if !email.validate_email() {
                return Err(Error::Validation("Invalid email format".to_string()));
            }
        }

        if let Some(ref username) = self.username {
            if username.trim().is_empty() {
                return Err(Error::Validation("Username must not be blank".to_string()));
            }
        }

        self.policy.check(i64::from(self.max_emails))?;
        Ok(())
    }

    /// Validate and turn into the stored user with `role` as its effective role
    pub fn into_user(self, role: RoleName) -> Result<DirectoryUser> {
        self.validate()?;
        Ok(DirectoryUser {
            id: self.id,
            name: self.name,
            username: self.username,
            email: self.email,
            max_emails: self.max_emails,
            created_at: self.created_at,
            role,
        })
    }
}

/// Parse an opaque user id; anything that is not a UUID cannot name a user.
pub fn parse_user_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}
