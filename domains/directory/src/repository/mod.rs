//! Store seams for the directory domain
//!
//! Two adapters implement them: [`PgDirectoryStore`]/[`PgMailboxStore`] over
//! Postgres, and [`InMemoryDirectory`] for local runs and tests.

pub mod memory;
pub mod postgres;


use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use mailroom_auth::IdentityLookup;
use mailroom_common::{RepositoryError, RoleName};

use crate::domain::entities::{DirectoryUser, NewUser, QuotaBucket};

pub use memory::InMemoryDirectory;
pub use postgres::{PgDirectoryStore, PgMailboxStore};

pub type StoreResult<T> = std::result::Result<T, RepositoryError>;

/// Users joined with their effective role, plus the role-assignment writes
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Insert a user after checking it against the policy it was built under.
    ///
    /// `InvalidData` for a row outside the policy, `AlreadyExists` on a
    /// username or email clash.
    async fn create_user(&self, user: NewUser) -> StoreResult<Uuid>;

    /// Users whose name, username or email contains `search` (case-insensitive),
    /// all users when `search` is `None`. Ordered by id.
    async fn search_users(&self, search: Option<&str>) -> StoreResult<Vec<DirectoryUser>>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<DirectoryUser>>;

    /// Exact match
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<DirectoryUser>>;

    /// Exact match
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<DirectoryUser>>;

    /// Set `maxEmails` and return the value it replaced, `None` if the user is gone.
    async fn update_max_emails(&self, id: Uuid, max_emails: i32) -> StoreResult<Option<i32>>;

    /// Replace the user's single role assignment.
    ///
    /// Fails with `NotFound` if the user or the role reference row is missing.
    async fn assign_role(&self, id: Uuid, role: RoleName) -> StoreResult<()>;

    /// Whether the role reference row exists
    async fn role_exists(&self, role: RoleName) -> StoreResult<bool>;

    /// Delete every user whose effective role is `role` and return how many went.
    /// For `Civilian` this includes users with no assignment.
    async fn delete_users_with_role(&self, role: RoleName) -> StoreResult<u64>;

    async fn count_users(&self) -> StoreResult<i64>;

    /// Users whose creation time is strictly after `since`
    async fn count_users_created_after(&self, since: DateTime<Utc>) -> StoreResult<i64>;

    /// Effective role per user, grouped. Roles with no members may be absent.
    async fn count_users_by_role(&self) -> StoreResult<HashMap<RoleName, i64>>;

    /// User count per `maxEmails` value, ascending by value
    async fn quota_distribution(&self) -> StoreResult<Vec<QuotaBucket>>;
}

/// Read-only view of mailbox ownership
#[async_trait]
pub trait MailboxStore: Send + Sync {
    /// Lifetime mailbox count per owner, expired ones included.
    /// Owners without mailboxes may be absent from the map.
    async fn count_by_owners(&self, owners: &[Uuid]) -> StoreResult<HashMap<Uuid, i64>>;

    async fn count_all(&self) -> StoreResult<i64>;

    /// Mailboxes whose expiry is strictly after `at`
    async fn count_active_at(&self, at: DateTime<Utc>) -> StoreResult<i64>;
}

/// Operator overrides of the site settings, as key/value rows
#[async_trait]
pub trait SiteConfigStore: Send + Sync {
    async fn site_settings(&self) -> StoreResult<HashMap<String, String>>;

    /// Upsert every entry; all or none are written.
    async fn put_site_settings(&self, entries: &[(&'static str, String)]) -> StoreResult<()>;
}

/// Combined store access for the directory domain
#[derive(Clone)]
pub struct DirectoryStores {
    pub directory: Arc<dyn DirectoryStore>,
    pub mailboxes: Arc<dyn MailboxStore>,
    pub identities: Arc<dyn IdentityLookup>,
    pub site: Arc<dyn SiteConfigStore>,
}

impl DirectoryStores {
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        let directory = Arc::new(PgDirectoryStore::new(pool.clone()));
        Self {
            directory: directory.clone(),
            mailboxes: Arc::new(PgMailboxStore::new(pool)),
            identities: directory.clone(),
            site: directory,
        }
    }

    pub fn in_memory(store: InMemoryDirectory) -> Self {
        let store = Arc::new(store);
        Self {
            directory: store.clone(),
            mailboxes: store.clone(),
            identities: store.clone(),
            site: store,
        }
    }
}
