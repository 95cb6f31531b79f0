//! Site-wide settings shown on the admin dashboard
//!
//! Values come from configuration and may be overridden by an operator; the
//! overrides are kept as key/value rows so unknown or stale keys are harmless.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use mailroom_common::{Error, Result, RoleName};

pub const DEFAULT_ROLE_KEY: &str = "DEFAULT_ROLE";
pub const EMAIL_DOMAINS_KEY: &str = "EMAIL_DOMAINS";
pub const ADMIN_CONTACT_KEY: &str = "ADMIN_CONTACT";

/// Effective site settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    /// Role given to newly registered users; never `emperor`
    pub default_role: RoleName,
    /// Comma-separated mail domains offered for new addresses
    pub email_domains: String,
    pub admin_contact: String,
}

impl SiteConfig {
    /// Overlay stored overrides on these defaults.
    ///
    /// A stored role that no longer parses, or names `emperor`, is skipped.
    pub fn overlay(&self, stored: &HashMap<String, String>) -> Self {
        let default_role = stored
            .get(DEFAULT_ROLE_KEY)
            .and_then(|raw| match raw.parse::<RoleName>() {
                Ok(role) if role.is_assignable() => Some(role),
                _ => {
                    tracing::warn!(value = %raw, "Ignoring stored default role");
                    None
                }
            })
            .unwrap_or(self.default_role);

        Self {
            default_role,
            email_domains: stored
                .get(EMAIL_DOMAINS_KEY)
                .cloned()
                .unwrap_or_else(|| self.email_domains.clone()),
            admin_contact: stored
                .get(ADMIN_CONTACT_KEY)
                .cloned()
                .unwrap_or_else(|| self.admin_contact.clone()),
        }
    }

    /// Apply an operator update; omitted fields keep their current value.
    pub fn apply(&self, update: &SiteConfigUpdate) -> Result<Self> {
        let default_role = update
            .default_role
            .trim()
            .parse::<RoleName>()
            .ok()
            .filter(RoleName::is_assignable)
            .ok_or_else(|| {
                Error::Validation(format!(
                    "Invalid default role: {}; expected one of duke, knight, civilian",
                    update.default_role
                ))
            })?;

        Ok(Self {
            default_role,
            email_domains: update
                .email_domains
                .as_deref()
                .map(normalize_domains)
                .unwrap_or_else(|| self.email_domains.clone()),
            admin_contact: update
                .admin_contact
                .as_deref()
                .map(|c| c.trim().to_string())
                .unwrap_or_else(|| self.admin_contact.clone()),
        })
    }

    /// Rows to persist for these settings
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            (DEFAULT_ROLE_KEY, self.default_role.as_str().to_string()),
            (EMAIL_DOMAINS_KEY, self.email_domains.clone()),
            (ADMIN_CONTACT_KEY, self.admin_contact.clone()),
        ]
    }
}

/// Operator update as it arrives on the wire
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfigUpdate {
    #[serde(default)]
    pub default_role: String,
    #[serde(default)]
    pub email_domains: Option<String>,
    #[serde(default)]
    pub admin_contact: Option<String>,
}

/// Trim each domain and drop empty entries: `" a.test, ,b.test"` → `"a.test,b.test"`
fn normalize_domains(raw: &str) -> String {
    raw.split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}
