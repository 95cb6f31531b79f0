//! Shared utilities, configuration, and error handling for Mailroom
//!
//! This crate provides common functionality used across the Mailroom admin service:
//! - Configuration management following 12-factor principles
//! - Error types and their HTTP mapping
//! - The role tiers and the permission predicate
//! - Request extractors for paging and validated JSON bodies

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod roles;

pub use config::{Config, StoreBackend};
pub use db::RepositoryError;
pub use error::{Error, Result};
pub use extractors::{PageQuery, ValidatedJson};
pub use roles::{has_permission, ParseRoleError, Permission, RoleName};
