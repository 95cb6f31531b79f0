//! Directory domain state and auth backend integration

use axum::extract::FromRef;
use std::sync::Arc;

use mailroom_auth::{AuthBackend, AuthConfig};

use crate::domain::quota::QuotaPolicy;
use crate::domain::site::SiteConfig;
use crate::repository::DirectoryStores;
use crate::service::DirectoryServices;

/// Application state for the directory domain
#[derive(Clone)]
pub struct DirectoryState {
    pub services: DirectoryServices,
    pub auth: AuthBackend,
}

impl DirectoryState {
    pub fn new(
        stores: DirectoryStores,
        policy: QuotaPolicy,
        site_defaults: SiteConfig,
        auth_config: AuthConfig,
    ) -> Self {
        let auth = AuthBackend::new(Arc::clone(&stores.identities), auth_config);
        Self {
            services: DirectoryServices::new(&stores, policy, site_defaults),
            auth,
        }
    }
}

impl FromRef<DirectoryState> for AuthBackend {
    fn from_ref(state: &DirectoryState) -> Self {
        state.auth.clone()
    }
}
