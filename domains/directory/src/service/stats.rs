//! Admin statistics

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use mailroom_auth::AuthContext;
use mailroom_common::{Permission, Result, RoleName};

use crate::domain::entities::QuotaBucket;
use crate::repository::{DirectoryStore, MailboxStore};

/// Trailing window for "recent users"
pub const RECENT_USER_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_users: i64,
    pub active_emails: i64,
    pub total_emails: i64,
    pub recent_users: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleStat {
    pub role_name: RoleName,
    pub display_name: String,
    pub role_description: String,
    pub user_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewStats {
    pub overview: Overview,
    pub role_stats: Vec<RoleStat>,
    pub email_limit_stats: Vec<QuotaBucket>,
    pub last_updated: DateTime<Utc>,
}

/// Member count for each of the four roles, zero included
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCounts {
    pub emperor: i64,
    pub duke: i64,
    pub knight: i64,
    pub civilian: i64,
}

impl RoleCounts {
    pub fn from_grouped(grouped: &HashMap<RoleName, i64>) -> Self {
        let get = |role: RoleName| grouped.get(&role).copied().unwrap_or(0);
        Self {
            emperor: get(RoleName::Emperor),
            duke: get(RoleName::Duke),
            knight: get(RoleName::Knight),
            civilian: get(RoleName::Civilian),
        }
    }

    pub fn get(&self, role: RoleName) -> i64 {
        match role {
            RoleName::Emperor => self.emperor,
            RoleName::Duke => self.duke,
            RoleName::Knight => self.knight,
            RoleName::Civilian => self.civilian,
        }
    }
}

/// Read-only aggregates over the directory and mailbox stores
#[derive(Clone)]
pub struct StatsService {
    directory: Arc<dyn DirectoryStore>,
    mailboxes: Arc<dyn MailboxStore>,
}

impl StatsService {
    pub fn new(directory: Arc<dyn DirectoryStore>, mailboxes: Arc<dyn MailboxStore>) -> Self {
        Self {
            directory,
            mailboxes,
        }
    }

    pub async fn overview(&self, ctx: &AuthContext) -> Result<OverviewStats> {
        self.overview_at(ctx, Utc::now()).await
    }

    /// Overview evaluated at `now`
    pub async fn overview_at(&self, ctx: &AuthContext, now: DateTime<Utc>) -> Result<OverviewStats> {
        ctx.require(Permission::ManageUsers)?;

        let total_users = self.directory.count_users().await?;
        let total_emails = self.mailboxes.count_all().await?;
        let active_emails = self.mailboxes.count_active_at(now).await?;
        let recent_users = self
            .directory
            .count_users_created_after(now - Duration::days(RECENT_USER_WINDOW_DAYS))
            .await?;
        let counts = self.role_counts().await?;
        let email_limit_stats = self.directory.quota_distribution().await?;

        let role_stats = RoleName::ALL
            .into_iter()
            .map(|role| RoleStat {
                role_name: role,
                display_name: role.display_name().to_string(),
                role_description: role.description().to_string(),
                user_count: counts.get(role),
            })
            .collect();

        Ok(OverviewStats {
            overview: Overview {
                total_users,
                active_emails,
                total_emails,
                recent_users,
            },
            role_stats,
            email_limit_stats,
            last_updated: now,
        })
    }

    /// Per-role member counts; readable without a permission.
    pub async fn role_counts(&self) -> Result<RoleCounts> {
        let grouped = self.directory.count_users_by_role().await?;
        Ok(RoleCounts::from_grouped(&grouped))
    }
}
