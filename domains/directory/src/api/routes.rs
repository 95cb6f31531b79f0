//! Route definitions for the directory API

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use super::handlers::{account, admin, roles, site};
use super::middleware::DirectoryState;

/// Admin dashboard routes
fn admin_routes() -> Router<DirectoryState> {
    Router::new()
        .route(
            "/api/admin/users",
            get(admin::list_users).patch(admin::batch_update_quotas),
        )
        .route("/api/admin/stats", get(admin::overview_stats))
}

/// Role and quota management routes
fn role_routes() -> Router<DirectoryState> {
    Router::new()
        .route("/api/roles/users", post(roles::find_user))
        .route(
            "/api/roles/users/{id}/max-emails",
            patch(roles::update_max_emails),
        )
        .route("/api/roles/promote", post(roles::promote_user))
        .route(
            "/api/roles/delete-uncertified",
            delete(roles::delete_uncertified),
        )
        .route("/api/roles/stats", get(roles::role_stats))
}

/// Current-user routes
fn account_routes() -> Router<DirectoryState> {
    Router::new().route("/api/users/me", get(account::get_me))
}

/// Site settings routes
fn site_routes() -> Router<DirectoryState> {
    Router::new().route("/api/config", get(site::get_config).post(site::update_config))
}

/// Create all directory API routes
pub fn routes() -> Router<DirectoryState> {
    Router::new()
        .merge(admin_routes())
        .merge(role_routes())
        .merge(account_routes())
        .merge(site_routes())
}
