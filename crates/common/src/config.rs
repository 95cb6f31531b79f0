//! Configuration management following 12-factor app principles
//!
//! All configuration is loaded from environment variables to ensure
//! clean separation between code and config.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::roles::RoleName;

/// Default upper bound of the per-user mailbox quota
pub const DEFAULT_MAX_EMAILS_CEILING: i32 = 1000;

/// Default quota given to a newly created user
pub const DEFAULT_MAX_EMAILS: i32 = 1;

/// Mail domains offered when none are configured
pub const DEFAULT_EMAIL_DOMAINS: &str = "mailroom.local";

/// Which directory store backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(anyhow::anyhow!(
                "Unknown STORE_BACKEND: {}. Supported backends: postgres, memory",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory store backend
    pub store_backend: StoreBackend,

    /// Database connection URL, required for the postgres backend
    pub database_url: Option<String>,

    /// Apply SQL migrations on start-up
    pub run_migrations: bool,

    /// Bearer token verification
    pub jwt_secret: String,
    pub jwt_issuer: Option<String>,
    pub jwt_audience: Option<String>,

    /// Quota policy
    pub max_emails_ceiling: i32,
    pub default_max_emails: i32,

    /// Site settings served until an operator overrides them
    pub default_role: RoleName,
    pub email_domains: String,
    pub admin_contact: String,

    /// Comma-separated list of allowed CORS origins, `*` for any
    pub cors_allowed_origins: String,

    /// Local server port
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let store_backend: StoreBackend = env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse()?;

        let database_url = env::var("DATABASE_URL").ok();
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(anyhow::anyhow!(
                "DATABASE_URL is required when STORE_BACKEND=postgres"
            ));
        }

        let config = Self {
            store_backend,
            database_url,
            run_migrations: parse_flag("RUN_MIGRATIONS")?,

            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET is required"))?,
            jwt_issuer: env::var("JWT_ISSUER").ok(),
            jwt_audience: env::var("JWT_AUDIENCE").ok(),

            max_emails_ceiling: parse_or("MAX_EMAILS_CEILING", DEFAULT_MAX_EMAILS_CEILING)?,
            default_max_emails: parse_or("DEFAULT_MAX_EMAILS", DEFAULT_MAX_EMAILS)?,

            default_role: parse_default_role()?,
            email_domains: env::var("EMAIL_DOMAINS")
                .unwrap_or_else(|_| DEFAULT_EMAIL_DOMAINS.to_string()),
            admin_contact: env::var("ADMIN_CONTACT").unwrap_or_default(),

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),

            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .unwrap_or(3000),
        };

        Ok(config)
    }
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} must be a number: {}", key, e)),
        Err(_) => Ok(default),
    }
}

fn parse_default_role() -> Result<RoleName> {
    let role = match env::var("DEFAULT_ROLE") {
        Ok(raw) => raw
            .trim()
            .parse::<RoleName>()
            .map_err(|e| anyhow::anyhow!("DEFAULT_ROLE: {}", e))?,
        Err(_) => RoleName::Civilian,
    };
    if !role.is_assignable() {
        return Err(anyhow::anyhow!("DEFAULT_ROLE cannot be {}", role));
    }
    Ok(role)
}

fn parse_flag(key: &str) -> Result<bool> {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" | "" => Ok(false),
            other => Err(anyhow::anyhow!("{} must be true or false, got {}", key, other)),
        },
        Err(_) => Ok(false),
    }
}
