//! Authentication middleware for Mailroom
//!
//! Provides JWT validation, a fresh per-request role lookup, and axum
//! extractors that work with any domain state implementing `FromRef<S>`
//! for `AuthBackend`.

mod backend;
mod claims;
mod config;
mod context;
mod error;
mod extractors;
mod jwt;
mod types;

pub use backend::{AuthBackend, IdentityLookup};
pub use claims::SessionClaims;
pub use config::AuthConfig;
pub use context::AuthContext;
pub use error::AuthError;
pub use extractors::{AdminUser, AuthUser};
pub use jwt::issue_token;
pub use types::AuthIdentity;
