//! Mailroom application composition root
//!
//! Opens the configured directory store and mounts the directory router.

use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use mailroom_auth::{issue_token, AuthConfig};
use mailroom_common::{Config, RoleName, StoreBackend};
use mailroom_directory::{
    DirectoryState, DirectoryStores, InMemoryDirectory, NewUser, QuotaPolicy, SiteConfig,
};

/// Request bodies above this size are rejected with 413
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

pub fn auth_config(config: &Config) -> AuthConfig {
    AuthConfig {
        jwt_secret: config.jwt_secret.clone(),
        issuer: config.jwt_issuer.clone(),
        audience: config.jwt_audience.clone(),
    }
}

pub fn quota_policy(config: &Config) -> anyhow::Result<QuotaPolicy> {
    QuotaPolicy::new(config.max_emails_ceiling, config.default_max_emails)
        .map_err(|e| anyhow::anyhow!("Invalid quota configuration: {}", e))
}

/// Site settings served until an operator overrides them
pub fn site_defaults(config: &Config) -> SiteConfig {
    SiteConfig {
        default_role: config.default_role,
        email_domains: config.email_domains.clone(),
        admin_contact: config.admin_contact.clone(),
    }
}

/// Open the directory store selected by `STORE_BACKEND`
pub async fn open_stores(config: &Config) -> anyhow::Result<DirectoryStores> {
    match config.store_backend {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for postgres"))?;

            let pool = PgPoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(5))
                .connect(url)
                .await
                .map_err(|e| anyhow::anyhow!("Database connection failed: {}", e))?;

            if config.run_migrations {
                sqlx::migrate!("../../migrations").run(&pool).await?;
                tracing::info!("Database migrations applied");
            }

            Ok(DirectoryStores::postgres(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory directory store; data is lost on restart");
            Ok(DirectoryStores::in_memory(InMemoryDirectory::new()))
        }
    }
}

/// Insert an emperor into an in-memory directory and return a bearer token for it
pub fn seed_dev_admin(
    store: &InMemoryDirectory,
    config: &Config,
    ttl_seconds: u64,
) -> anyhow::Result<String> {
    let policy = quota_policy(config)?;
    let id = store.insert_user(
        NewUser::new(&policy)
            .with_name("Development Admin")
            .with_username("admin")
            .with_email("admin@mailroom.local"),
    )?;
    store.set_role(id, RoleName::Emperor)?;
    let token = issue_token(id, &auth_config(config), ttl_seconds)?;
    Ok(token)
}

/// Create the main application router with all routes
pub fn create_app(config: &Config, stores: DirectoryStores) -> anyhow::Result<Router> {
    let state = DirectoryState::new(
        stores,
        quota_policy(config)?,
        site_defaults(config),
        auth_config(config),
    );

    let app = Router::new()
        .route("/health", axum::routing::get(health_check))
        .route(
            "/",
            axum::routing::get(|| async { "Mailroom Admin API v0.0.1-SNAPSHOT" }),
        )
        .merge(mailroom_directory::routes().with_state(state));

    Ok(app)
}

/// CORS layer from a comma-separated origin list; `*` allows any origin.
pub fn build_cors_layer(origins: &str) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let origins = origins.trim();
    if origins == "*" || origins.is_empty() {
        return base.allow_origin(AllowOrigin::any());
    }

    let parsed: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(parsed))
}

pub fn body_limit_layer() -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(MAX_BODY_BYTES)
}

/// Wrap the router in request tracing, CORS and the body limit.
///
/// The body limit sits outside CORS: `CorsLayer` needs a `Default` response
/// body, which the limited body type does not provide.
pub fn with_middleware(app: Router, config: &Config) -> Router {
    app.layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(&config.cors_allowed_origins))
        .layer(body_limit_layer())
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
