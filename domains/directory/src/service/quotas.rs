//! Quota updates, single and batch

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use mailroom_auth::AuthContext;
use mailroom_common::{Error, Permission, Result};

use crate::domain::entities::parse_user_id;
use crate::domain::quota::{QuotaPolicy, QuotaUpdate, RawQuotaUpdate};
use crate::repository::DirectoryStore;

const USER_NOT_FOUND: &str = "User not found";

/// Outcome of a single quota update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaChange {
    pub user_id: Uuid,
    /// Username, email or id of the target, for operator messages
    pub label: String,
    pub old_max_emails: i32,
    pub new_max_emails: i32,
}

/// Per-item result of a batch update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemResult {
    pub user_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_max_emails: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_max_emails: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchItemResult {
    fn applied(user_id: String, old: i32, new: i32) -> Self {
        Self {
            user_id,
            success: true,
            old_max_emails: Some(old),
            new_max_emails: Some(new),
            error: None,
        }
    }

    fn failed(user_id: String, error: &str) -> Self {
        Self {
            user_id,
            success: false,
            old_max_emails: None,
            new_max_emails: None,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub success: usize,
    pub failure: usize,
}

impl BatchSummary {
    pub fn of(results: &[BatchItemResult]) -> Self {
        let success = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            success,
            failure: results.len() - success,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub results: Vec<BatchItemResult>,
    pub summary: BatchSummary,
}

/// Writes to `maxEmails`, always within the configured bounds
#[derive(Clone)]
pub struct QuotaService {
    directory: Arc<dyn DirectoryStore>,
    policy: QuotaPolicy,
}

impl QuotaService {
    pub fn new(directory: Arc<dyn DirectoryStore>, policy: QuotaPolicy) -> Self {
        Self { directory, policy }
    }

    pub fn policy(&self) -> &QuotaPolicy {
        &self.policy
    }

    /// Set one user's quota. The value is checked before the user is resolved.
    pub async fn set_max_emails(
        &self,
        ctx: &AuthContext,
        user_id: &str,
        value: i64,
    ) -> Result<QuotaChange> {
        ctx.require(Permission::ManageUsers)?;
        let max_emails = self.policy.check(value)?;

        let not_found = || Error::NotFound(USER_NOT_FOUND.to_string());
        let id = parse_user_id(user_id).ok_or_else(not_found)?;
        let user = self.directory.find_user(id).await?.ok_or_else(not_found)?;
        let old_max_emails = self
            .directory
            .update_max_emails(id, max_emails)
            .await?
            .ok_or_else(not_found)?;

        tracing::info!(
            caller = %ctx.user_id(),
            user_id = %id,
            old_max_emails,
            new_max_emails = max_emails,
            "Updated mailbox quota"
        );

        Ok(QuotaChange {
            user_id: id,
            label: user.display_label(),
            old_max_emails,
            new_max_emails: max_emails,
        })
    }

    /// Gate the whole list, then apply each item on its own.
    pub async fn batch_set_max_emails(
        &self,
        ctx: &AuthContext,
        updates: &[RawQuotaUpdate],
    ) -> Result<BatchOutcome> {
        ctx.require(Permission::ManageUsers)?;
        let validated = self.policy.validate_batch(updates)?;

        let mut results = Vec::with_capacity(validated.len());
        for update in validated {
            results.push(self.apply(update).await);
        }
        let summary = BatchSummary::of(&results);

        tracing::info!(
            caller = %ctx.user_id(),
            total = summary.total,
            success = summary.success,
            failure = summary.failure,
            "Applied batch quota update"
        );

        Ok(BatchOutcome { results, summary })
    }

    async fn apply(&self, update: QuotaUpdate) -> BatchItemResult {
        let Some(id) = parse_user_id(&update.user_id) else {
            return BatchItemResult::failed(update.user_id, USER_NOT_FOUND);
        };

        match self.directory.update_max_emails(id, update.max_emails).await {
            Ok(Some(old)) => BatchItemResult::applied(update.user_id, old, update.max_emails),
            Ok(None) => BatchItemResult::failed(update.user_id, USER_NOT_FOUND),
            Err(e) => {
                tracing::error!(error = %e, user_id = %id, "Batch quota item failed");
                BatchItemResult::failed(update.user_id, "Failed to update quota")
            }
        }
    }
}
