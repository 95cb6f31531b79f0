//! Directory services
//!
//! Every operation takes the caller's [`AuthContext`](mailroom_auth::AuthContext)
//! explicitly and checks its permission before touching a store.

pub mod quotas;
pub mod roles;
pub mod site;
pub mod stats;
pub mod users;

pub use quotas::{BatchItemResult, BatchOutcome, BatchSummary, QuotaChange, QuotaService};
pub use roles::{RoleAssignmentService, RoleChange, RoleChangeStatus};
pub use site::SiteConfigService;
pub use stats::{Overview, OverviewStats, RoleCounts, RoleStat, StatsService};
pub use users::UserQueryService;

use crate::domain::quota::QuotaPolicy;
use crate::domain::site::SiteConfig;
use crate::repository::DirectoryStores;

/// All directory services over one set of stores
#[derive(Clone)]
pub struct DirectoryServices {
    pub users: UserQueryService,
    pub quotas: QuotaService,
    pub roles: RoleAssignmentService,
    pub stats: StatsService,
    pub site: SiteConfigService,
}

impl DirectoryServices {
    pub fn new(stores: &DirectoryStores, policy: QuotaPolicy, site_defaults: SiteConfig) -> Self {
        Self {
            users: UserQueryService::new(stores.directory.clone(), stores.mailboxes.clone()),
            quotas: QuotaService::new(stores.directory.clone(), policy),
            roles: RoleAssignmentService::new(stores.directory.clone()),
            stats: StatsService::new(stores.directory.clone(), stores.mailboxes.clone()),
            site: SiteConfigService::new(stores.site.clone(), site_defaults),
        }
    }
}
