//! In-memory directory store
//!
//! Backs local runs without a database and the service/API tests. Users are
//! kept ordered by id so listings are deterministic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use mailroom_auth::{AuthIdentity, IdentityLookup};
use mailroom_common::{RepositoryError, RoleName};

use super::{DirectoryStore, MailboxStore, SiteConfigStore, StoreResult};
use crate::domain::entities::{DirectoryUser, Mailbox, NewUser, QuotaBucket};

#[derive(Debug)]
struct State {
    /// Stored rows keep the default role; `assignments` holds the real one
    users: BTreeMap<Uuid, DirectoryUser>,
    assignments: HashMap<Uuid, RoleName>,
    roles: HashSet<RoleName>,
    mailboxes: Vec<Mailbox>,
    site: HashMap<String, String>,
}

impl State {
    fn role_of(&self, id: &Uuid) -> RoleName {
        self.assignments.get(id).copied().unwrap_or_default()
    }

    fn view(&self, row: &DirectoryUser) -> DirectoryUser {
        DirectoryUser {
            role: self.role_of(&row.id),
            ..row.clone()
        }
    }

    fn find_by(&self, pred: impl Fn(&DirectoryUser) -> bool) -> Option<DirectoryUser> {
        self.users.values().find(|row| pred(row)).map(|row| self.view(row))
    }
}

/// Directory, mailbox and identity store held in process memory
#[derive(Debug, Clone)]
pub struct InMemoryDirectory {
    state: Arc<Mutex<State>>,
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDirectory {
    /// Empty directory with all four role reference rows present
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                users: BTreeMap::new(),
                assignments: HashMap::new(),
                roles: RoleName::ALL.into_iter().collect(),
                mailboxes: Vec::new(),
                site: HashMap::new(),
            })),
        }
    }

    fn state(&self) -> StoreResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::InvalidData("directory state lock poisoned".to_string()))
    }

    /// Insert a user; username and email must be unique when present.
    ///
    /// Rows that break the user's quota policy or email format are refused
    /// with `InvalidData` and nothing is stored.
    pub fn insert_user(&self, user: NewUser) -> StoreResult<Uuid> {
        let user = user
            .into_user(RoleName::Civilian)
            .map_err(|e| RepositoryError::InvalidData(e.to_string()))?;
        let mut state = self.state()?;
        let clash = state.users.values().any(|existing| {
            existing.id == user.id
                || (user.username.is_some() && existing.username == user.username)
                || (user.email.is_some() && existing.email == user.email)
        });
        if clash {
            return Err(RepositoryError::AlreadyExists);
        }
        let id = user.id;
        state.users.insert(id, user);
        Ok(id)
    }

    /// Set a role assignment directly, emperor included
    pub fn set_role(&self, id: Uuid, role: RoleName) -> StoreResult<()> {
        let mut state = self.state()?;
        if !state.users.contains_key(&id) || !state.roles.contains(&role) {
            return Err(RepositoryError::NotFound);
        }
        state.assignments.insert(id, role);
        Ok(())
    }

    pub fn add_mailbox(&self, mailbox: Mailbox) -> StoreResult<()> {
        let mut state = self.state()?;
        if !state.users.contains_key(&mailbox.owner_id) {
            return Err(RepositoryError::NotFound);
        }
        state.mailboxes.push(mailbox);
        Ok(())
    }

    /// Delete a user together with its assignment and mailboxes
    pub fn remove_user(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state()?;
        let existed = state.users.remove(&id).is_some();
        state.assignments.remove(&id);
        state.mailboxes.retain(|m| m.owner_id != id);
        Ok(existed)
    }

    /// Drop a role reference row; used to model a directory that was never seeded
    pub fn remove_role_reference(&self, role: RoleName) -> StoreResult<()> {
        self.state()?.roles.remove(&role);
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> StoreResult<Option<DirectoryUser>> {
        let state = self.state()?;
        Ok(state.users.get(&id).map(|row| state.view(row)))
    }

    pub fn user_count(&self) -> StoreResult<usize> {
        Ok(self.state()?.users.len())
    }
}

#[async_trait]
impl DirectoryStore for InMemoryDirectory {
    async fn create_user(&self, user: NewUser) -> StoreResult<Uuid> {
        self.insert_user(user)
    }

    async fn search_users(&self, search: Option<&str>) -> StoreResult<Vec<DirectoryUser>> {
        let state = self.state()?;
        let needle = search.map(str::to_lowercase);
        Ok(state
            .users
            .values()
            .map(|row| state.view(row))
            .filter(|user| match needle.as_deref() {
                Some(n) => user.matches_search(n),
                None => true,
            })
            .collect())
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<DirectoryUser>> {
        self.get(id)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<DirectoryUser>> {
        Ok(self.state()?.find_by(|u| u.email.as_deref() == Some(email)))
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<DirectoryUser>> {
        Ok(self
            .state()?
            .find_by(|u| u.username.as_deref() == Some(username)))
    }

    async fn update_max_emails(&self, id: Uuid, max_emails: i32) -> StoreResult<Option<i32>> {
        let mut state = self.state()?;
        Ok(state
            .users
            .get_mut(&id)
            .map(|row| std::mem::replace(&mut row.max_emails, max_emails)))
    }

    async fn assign_role(&self, id: Uuid, role: RoleName) -> StoreResult<()> {
        self.set_role(id, role)
    }

    async fn role_exists(&self, role: RoleName) -> StoreResult<bool> {
        Ok(self.state()?.roles.contains(&role))
    }

    async fn delete_users_with_role(&self, role: RoleName) -> StoreResult<u64> {
        let mut state = self.state()?;
        let doomed: Vec<Uuid> = state
            .users
            .keys()
            .filter(|id| state.role_of(id) == role)
            .copied()
            .collect();
        for id in &doomed {
            state.users.remove(id);
            state.assignments.remove(id);
        }
        state.mailboxes.retain(|m| !doomed.contains(&m.owner_id));
        Ok(doomed.len() as u64)
    }

    async fn count_users(&self) -> StoreResult<i64> {
        Ok(self.state()?.users.len() as i64)
    }

    async fn count_users_created_after(&self, since: DateTime<Utc>) -> StoreResult<i64> {
        Ok(self
            .state()?
            .users
            .values()
            .filter(|u| u.created_at.is_some_and(|t| t > since))
            .count() as i64)
    }

    async fn count_users_by_role(&self) -> StoreResult<HashMap<RoleName, i64>> {
        let state = self.state()?;
        let mut counts = HashMap::new();
        for id in state.users.keys() {
            *counts.entry(state.role_of(id)).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn quota_distribution(&self) -> StoreResult<Vec<QuotaBucket>> {
        let state = self.state()?;
        let mut buckets: BTreeMap<i32, i64> = BTreeMap::new();
        for user in state.users.values() {
            *buckets.entry(user.max_emails).or_insert(0) += 1;
        }
        Ok(buckets
            .into_iter()
            .map(|(max_emails, user_count)| QuotaBucket {
                max_emails,
                user_count,
            })
            .collect())
    }
}

#[async_trait]
impl MailboxStore for InMemoryDirectory {
    async fn count_by_owners(&self, owners: &[Uuid]) -> StoreResult<HashMap<Uuid, i64>> {
        let state = self.state()?;
        let wanted: HashSet<&Uuid> = owners.iter().collect();
        let mut counts = HashMap::new();
        for mailbox in state.mailboxes.iter().filter(|m| wanted.contains(&m.owner_id)) {
            *counts.entry(mailbox.owner_id).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn count_all(&self) -> StoreResult<i64> {
        Ok(self.state()?.mailboxes.len() as i64)
    }

    async fn count_active_at(&self, at: DateTime<Utc>) -> StoreResult<i64> {
        Ok(self
            .state()?
            .mailboxes
            .iter()
            .filter(|m| m.is_active_at(at))
            .count() as i64)
    }
}

#[async_trait]
impl SiteConfigStore for InMemoryDirectory {
    async fn site_settings(&self) -> StoreResult<HashMap<String, String>> {
        Ok(self.state()?.site.clone())
    }

    async fn put_site_settings(&self, entries: &[(&'static str, String)]) -> StoreResult<()> {
        let mut state = self.state()?;
        for (key, value) in entries {
            state.site.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityLookup for InMemoryDirectory {
    async fn find_identity(&self, user_id: Uuid) -> Result<Option<AuthIdentity>, RepositoryError> {
        Ok(self.get(user_id)?.map(AuthIdentity::from))
    }
}
