//! HTTP handlers for the directory domain

pub mod account;
pub mod admin;
pub mod roles;
pub mod site;

use axum::extract::rejection::QueryRejection;
use mailroom_common::Error;

/// Turn a query-string rejection into the JSON validation error shape
pub(crate) fn query_error(rejection: QueryRejection) -> Error {
    Error::Validation(rejection.body_text())
}
