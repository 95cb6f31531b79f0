//! User listing and lookup

use std::sync::Arc;
use uuid::Uuid;

use mailroom_auth::AuthContext;
use mailroom_common::{Error, Permission, Result};

use crate::domain::entities::{DirectoryUser, UserListItem};
use crate::domain::listing::{filter_by_role, paginate, sort_users, ListUsersParams, UserPage};
use crate::repository::{DirectoryStore, MailboxStore};

/// Read side of the directory: paginated listing, lookup, own profile
#[derive(Clone)]
pub struct UserQueryService {
    directory: Arc<dyn DirectoryStore>,
    mailboxes: Arc<dyn MailboxStore>,
}

impl UserQueryService {
    pub fn new(directory: Arc<dyn DirectoryStore>, mailboxes: Arc<dyn MailboxStore>) -> Self {
        Self {
            directory,
            mailboxes,
        }
    }

    /// Search, filter by role, attach lifetime mailbox counts, sort, then page.
    pub async fn list_users(&self, ctx: &AuthContext, params: &ListUsersParams) -> Result<UserPage> {
        ctx.require(Permission::ManageUsers)?;

        let candidates = self.directory.search_users(params.search_term()).await?;
        let candidates = filter_by_role(candidates, params.role_filter());

        let mut items = self.attach_counts(candidates).await?;
        sort_users(&mut items, params.sort_key(), params.sort_order());
        let (users, pagination) = paginate(items, params.page_query());

        tracing::debug!(
            caller = %ctx.user_id(),
            total = pagination.total_count,
            page = pagination.page,
            "Listed users"
        );

        Ok(UserPage {
            users,
            pagination,
            filters: params.applied(),
        })
    }

    /// Look a user up by email when the text contains `@`, by username otherwise.
    pub async fn find_by_identifier(
        &self,
        ctx: &AuthContext,
        search_text: &str,
    ) -> Result<UserListItem> {
        ctx.require(Permission::ManageUsers)?;

        let text = search_text.trim();
        if text.is_empty() {
            return Err(Error::Validation("Search text must not be empty".to_string()));
        }

        let user = if text.contains('@') {
            self.directory.find_user_by_email(text).await?
        } else {
            self.directory.find_user_by_username(text).await?
        };
        let user = user.ok_or_else(|| Error::NotFound("User not found".to_string()))?;

        self.with_count(user).await
    }

    /// The caller's own directory entry
    pub async fn profile(&self, ctx: &AuthContext) -> Result<UserListItem> {
        let user = self
            .directory
            .find_user(ctx.user_id())
            .await?
            .ok_or_else(|| Error::NotFound("User not found".to_string()))?;

        self.with_count(user).await
    }

    async fn with_count(&self, user: DirectoryUser) -> Result<UserListItem> {
        let mut items = self.attach_counts(vec![user]).await?;
        items
            .pop()
            .ok_or_else(|| Error::Internal("Lookup produced no row".to_string()))
    }

    /// One grouped count query for the whole candidate set
    async fn attach_counts(&self, users: Vec<DirectoryUser>) -> Result<Vec<UserListItem>> {
        let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
        let counts = self.mailboxes.count_by_owners(&ids).await?;
        Ok(users
            .into_iter()
            .map(|user| {
                let count = counts.get(&user.id).copied().unwrap_or(0);
                UserListItem::from_user(user, count)
            })
            .collect())
    }
}
