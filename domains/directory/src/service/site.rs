//! Site settings: configured defaults with operator overrides

use std::sync::Arc;

use mailroom_auth::AuthContext;
use mailroom_common::{Permission, Result};

use crate::domain::site::{SiteConfig, SiteConfigUpdate};
use crate::repository::SiteConfigStore;

#[derive(Clone)]
pub struct SiteConfigService {
    store: Arc<dyn SiteConfigStore>,
    defaults: SiteConfig,
}

impl SiteConfigService {
    pub fn new(store: Arc<dyn SiteConfigStore>, defaults: SiteConfig) -> Self {
        Self { store, defaults }
    }

    /// Effective settings; readable without a permission.
    pub async fn current(&self) -> Result<SiteConfig> {
        let stored = self.store.site_settings().await?;
        Ok(self.defaults.overlay(&stored))
    }

    /// Replace the settings. The default role must be duke, knight or civilian.
    pub async fn update(&self, ctx: &AuthContext, update: &SiteConfigUpdate) -> Result<SiteConfig> {
        ctx.require(Permission::ManageUsers)?;

        let next = self.current().await?.apply(update)?;
        self.store.put_site_settings(&next.entries()).await?;

        tracing::info!(
            actor = %ctx.user_id(),
            default_role = %next.default_role,
            "Site settings updated"
        );

        Ok(next)
    }
}
