//! Current-user handlers
//!
//! - GET /api/users/me - The caller's own directory entry

use axum::{extract::State, response::Json};

use mailroom_auth::AuthUser;
use mailroom_common::Result;

use crate::api::middleware::DirectoryState;
use crate::domain::entities::UserListItem;

/// GET /api/users/me
pub async fn get_me(
    AuthUser(ctx): AuthUser,
    State(state): State<DirectoryState>,
) -> Result<Json<UserListItem>> {
    let me = state.services.users.profile(&ctx).await?;
    Ok(Json(me))
}
