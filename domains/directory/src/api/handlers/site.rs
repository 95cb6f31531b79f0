//! Site settings handlers
//!
//! - GET /api/config - Effective site settings
//! - POST /api/config - Replace the site settings

use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use mailroom_auth::AdminUser;
use mailroom_common::{Result, ValidatedJson};

use crate::api::middleware::DirectoryState;
use crate::domain::site::{SiteConfig, SiteConfigUpdate};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSiteConfigRequest {
    #[validate(length(min = 1, message = "defaultRole is required"))]
    #[serde(default)]
    pub default_role: String,
    #[serde(default)]
    pub email_domains: Option<String>,
    #[validate(length(max = 320))]
    #[serde(default)]
    pub admin_contact: Option<String>,
}

impl From<UpdateSiteConfigRequest> for SiteConfigUpdate {
    fn from(request: UpdateSiteConfigRequest) -> Self {
        Self {
            default_role: request.default_role,
            email_domains: request.email_domains,
            admin_contact: request.admin_contact,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UpdateSiteConfigResponse {
    pub success: bool,
    pub config: SiteConfig,
}

/// GET /api/config
pub async fn get_config(State(state): State<DirectoryState>) -> Result<Json<SiteConfig>> {
    let config = state.services.site.current().await?;
    Ok(Json(config))
}

/// POST /api/config
pub async fn update_config(
    AdminUser(ctx): AdminUser,
    State(state): State<DirectoryState>,
    ValidatedJson(request): ValidatedJson<UpdateSiteConfigRequest>,
) -> Result<Json<UpdateSiteConfigResponse>> {
    let config = state
        .services
        .site
        .update(&ctx, &request.into())
        .await?;
    Ok(Json(UpdateSiteConfigResponse {
        success: true,
        config,
    }))
}
