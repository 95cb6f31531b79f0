//! API endpoint integration tests
//!
//! Drives the full router (auth extractors, handlers, services, in-memory store).

#![allow(dead_code)]

mod account;
mod admin_users;
mod auth;
mod common;
mod quotas;
mod roles;
mod site_config;
mod stats;
