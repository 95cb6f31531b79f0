//! Admin dashboard handlers
//!
//! - GET /api/admin/users - Paginated user listing
//! - PATCH /api/admin/users - Batch quota update
//! - GET /api/admin/stats - Overview statistics

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use mailroom_auth::AdminUser;
use mailroom_common::{Result, ValidatedJson};

use super::query_error;
use crate::api::middleware::DirectoryState;
use crate::domain::listing::{ListUsersParams, UserPage};
use crate::domain::quota::RawQuotaUpdate;
use crate::service::{BatchItemResult, BatchSummary, OverviewStats};

#[derive(Debug, Deserialize, Validate)]
pub struct BatchUpdateRequest {
    #[serde(default)]
    pub updates: Vec<RawQuotaUpdate>,
}

#[derive(Debug, Serialize)]
pub struct BatchUpdateResponse {
    pub success: bool,
    pub results: Vec<BatchItemResult>,
    pub summary: BatchSummary,
}

/// GET /api/admin/users
pub async fn list_users(
    AdminUser(ctx): AdminUser,
    State(state): State<DirectoryState>,
    query: std::result::Result<Query<ListUsersParams>, QueryRejection>,
) -> Result<Json<UserPage>> {
    let Query(params) = query.map_err(query_error)?;
    let page = state.services.users.list_users(&ctx, &params).await?;
    Ok(Json(page))
}

/// PATCH /api/admin/users
pub async fn batch_update_quotas(
    AdminUser(ctx): AdminUser,
    State(state): State<DirectoryState>,
    ValidatedJson(request): ValidatedJson<BatchUpdateRequest>,
) -> Result<Json<BatchUpdateResponse>> {
    let outcome = state
        .services
        .quotas
        .batch_set_max_emails(&ctx, &request.updates)
        .await?;

    Ok(Json(BatchUpdateResponse {
        success: true,
        results: outcome.results,
        summary: outcome.summary,
    }))
}

/// GET /api/admin/stats
pub async fn overview_stats(
    AdminUser(ctx): AdminUser,
    State(state): State<DirectoryState>,
) -> Result<Json<OverviewStats>> {
    let stats = state.services.stats.overview(&ctx).await?;
    Ok(Json(stats))
}
