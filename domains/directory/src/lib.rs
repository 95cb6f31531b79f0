//! Directory domain: role model, user listing, quotas, role assignment, admin statistics,
//! site settings

pub mod api;
pub mod domain;
pub mod repository;
pub mod service;

// Re-export domain types at the crate root for convenience
pub use domain::entities::*;
pub use domain::listing::{
    paginate, sort_users, AppliedFilters, ListUsersParams, PaginationMeta, SortKey, SortOrder,
    UserPage,
};
pub use domain::quota::{QuotaPolicy, QuotaUpdate, RawQuotaUpdate};
pub use domain::site::{SiteConfig, SiteConfigUpdate};

// Re-export repository types
pub use repository::{
    DirectoryStore, DirectoryStores, InMemoryDirectory, MailboxStore, PgDirectoryStore,
    PgMailboxStore, SiteConfigStore,
};

// Re-export service types
pub use service::{
    BatchItemResult, BatchOutcome, BatchSummary, DirectoryServices, OverviewStats, QuotaChange,
    QuotaService, RoleAssignmentService, RoleChange, RoleCounts, SiteConfigService, StatsService,
    UserQueryService,
};

// Re-export API types
pub use api::routes;
pub use api::DirectoryState;

// Re-export auth types from mailroom-auth for convenience
pub use mailroom_auth::{AdminUser, AuthBackend, AuthConfig, AuthContext, AuthError, AuthUser};
