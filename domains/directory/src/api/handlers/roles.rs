//! Role and quota management handlers
//!
//! - POST /api/roles/users - Find a user by email or username
//! - PATCH /api/roles/users/{id}/max-emails - Set one user's quota
//! - POST /api/roles/promote - Set a user's role
//! - DELETE /api/roles/delete-uncertified - Delete all civilians
//! - GET /api/roles/stats - Per-role member counts

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use mailroom_auth::AdminUser;
use mailroom_common::{Error, Result, RoleName, ValidatedJson};

use crate::api::middleware::DirectoryState;
use crate::domain::entities::UserListItem;
use crate::domain::quota::json_integer;
use crate::service::{RoleChangeStatus, RoleCounts};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FindUserRequest {
    #[serde(default)]
    pub search_text: String,
}

#[derive(Debug, Serialize)]
pub struct FindUserResponse {
    pub user: UserListItem,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMaxEmailsRequest {
    #[serde(default)]
    pub max_emails: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMaxEmailsResponse {
    pub success: bool,
    pub message: String,
    pub old_max_emails: i32,
    pub new_max_emails: i32,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PromoteRequest {
    #[validate(length(min = 1))]
    pub user_id: String,
    #[validate(length(min = 1))]
    pub role_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoteResponse {
    pub success: bool,
    pub status: RoleChangeStatus,
    pub message: String,
    pub user_id: Uuid,
    pub previous_role: RoleName,
    pub role: RoleName,
}

#[derive(Debug, Serialize)]
pub struct DeleteUncertifiedResponse {
    pub success: bool,
    pub message: String,
    pub deleted: u64,
}

/// POST /api/roles/users
pub async fn find_user(
    AdminUser(ctx): AdminUser,
    State(state): State<DirectoryState>,
    ValidatedJson(request): ValidatedJson<FindUserRequest>,
) -> Result<Json<FindUserResponse>> {
    let user = state
        .services
        .users
        .find_by_identifier(&ctx, &request.search_text)
        .await?;
    Ok(Json(FindUserResponse { user }))
}

/// PATCH /api/roles/users/{id}/max-emails
pub async fn update_max_emails(
    AdminUser(ctx): AdminUser,
    State(state): State<DirectoryState>,
    Path(user_id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateMaxEmailsRequest>,
) -> Result<Json<UpdateMaxEmailsResponse>> {
    let raw = request
        .max_emails
        .ok_or_else(|| Error::Validation("maxEmails is required".to_string()))?;
    let value = json_integer(&raw)?;

    let change = state
        .services
        .quotas
        .set_max_emails(&ctx, &user_id, value)
        .await?;

    Ok(Json(UpdateMaxEmailsResponse {
        success: true,
        message: format!(
            "Updated mailbox quota for {} to {}",
            change.label, change.new_max_emails
        ),
        old_max_emails: change.old_max_emails,
        new_max_emails: change.new_max_emails,
    }))
}

/// POST /api/roles/promote
pub async fn promote_user(
    AdminUser(ctx): AdminUser,
    State(state): State<DirectoryState>,
    ValidatedJson(request): ValidatedJson<PromoteRequest>,
) -> Result<Json<PromoteResponse>> {
    let change = state
        .services
        .roles
        .promote_user(&ctx, &request.user_id, &request.role_name)
        .await?;

    let message = match change.status {
        RoleChangeStatus::Updated => format!("{} is now {}", change.label, change.role),
        RoleChangeStatus::Unchanged => format!("{} is already {}", change.label, change.role),
    };

    Ok(Json(PromoteResponse {
        success: true,
        status: change.status,
        message,
        user_id: change.user_id,
        previous_role: change.previous_role,
        role: change.role,
    }))
}

/// DELETE /api/roles/delete-uncertified
pub async fn delete_uncertified(
    AdminUser(ctx): AdminUser,
    State(state): State<DirectoryState>,
) -> Result<Json<DeleteUncertifiedResponse>> {
    let deleted = state.services.roles.delete_uncertified_users(&ctx).await?;
    Ok(Json(DeleteUncertifiedResponse {
        success: true,
        message: format!("Deleted {} uncertified users", deleted),
        deleted,
    }))
}

/// GET /api/roles/stats
pub async fn role_stats(State(state): State<DirectoryState>) -> Result<Json<RoleCounts>> {
    let counts = state.services.stats.role_counts().await?;
    Ok(Json(counts))
}
