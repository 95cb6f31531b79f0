//! Authentication backend
//!
//! Verifies the bearer token and then loads the caller's identity and
//! current role through [`IdentityLookup`]. Nothing is cached between
//! requests: a demotion takes effect on the caller's very next call.

use std::sync::Arc;

use mailroom_common::RepositoryError;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::context::AuthContext;
use crate::error::AuthError;
use crate::types::AuthIdentity;

/// Read seam into the directory for authentication.
///
/// Implemented by the directory stores; the role must already be resolved
/// (no assignment means civilian).
#[async_trait::async_trait]
pub trait IdentityLookup: Send + Sync {
    async fn find_identity(&self, user_id: Uuid) -> Result<Option<AuthIdentity>, RepositoryError>;
}

/// Authentication backend.
///
/// Domain states expose this via `FromRef`:
/// ```ignore
/// impl FromRef<MyDomainState> for AuthBackend {
///     fn from_ref(state: &MyDomainState) -> Self {
///         state.auth.clone()
///     }
/// }
/// ```
#[derive(Clone)]
pub struct AuthBackend {
    identities: Arc<dyn IdentityLookup>,
    config: AuthConfig,
}

impl AuthBackend {
    pub fn new(identities: Arc<dyn IdentityLookup>, config: AuthConfig) -> Self {
        Self { identities, config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Find user identity by ID
    pub(crate) async fn find_user(&self, id: Uuid) -> Result<Option<AuthIdentity>, AuthError> {
        self.identities.find_identity(id).await.map_err(|e| {
            tracing::error!(error = %e, user_id = %id, "Failed to load user");
            AuthError::UserLoadError
        })
    }

    /// Verify a bearer token and build the caller's permission context.
    pub(crate) async fn authenticate_jwt(&self, token: &str) -> Result<AuthContext, AuthError> {
        let claims = crate::jwt::validate_jwt_token(token, &self.config)?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;

        let user = self
            .find_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(AuthContext::new(user))
    }
}
