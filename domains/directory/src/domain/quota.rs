//! Mailbox quota policy and batch pre-validation

use serde::{Deserialize, Serialize};
use serde_json::Value;

use mailroom_common::{Error, Result};

/// Bounds and default for a user's `maxEmails`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaPolicy {
    ceiling: i32,
    default_max_emails: i32,
}

impl QuotaPolicy {
    /// Build a policy; the default must itself satisfy the bounds.
    pub fn new(ceiling: i32, default_max_emails: i32) -> Result<Self> {
        if ceiling < 0 {
            return Err(Error::Validation(format!(
                "Quota ceiling must be non-negative, got {}",
                ceiling
            )));
        }
        if !(0..=ceiling).contains(&default_max_emails) {
            return Err(Error::Validation(format!(
                "Default quota {} is outside [0, {}]",
                default_max_emails, ceiling
            )));
        }
        Ok(Self {
            ceiling,
            default_max_emails,
        })
    }

    pub fn ceiling(&self) -> i32 {
        self.ceiling
    }

    pub fn default_max_emails(&self) -> i32 {
        self.default_max_emails
    }

    /// Accept `value` if it lies in `[0, ceiling]`
    pub fn check(&self, value: i64) -> Result<i32> {
        if value < 0 || value > i64::from(self.ceiling) {
            return Err(self.out_of_range());
        }
        i32::try_from(value).map_err(|_| self.out_of_range())
    }

    /// Accept a raw JSON value if it is an integral number within bounds
    pub fn check_json(&self, value: &Value) -> Result<i32> {
        self.check(json_integer(value)?)
    }

    /// All-or-nothing gate over a batch. Any malformed item rejects the whole list.
    pub fn validate_batch(&self, updates: &[RawQuotaUpdate]) -> Result<Vec<QuotaUpdate>> {
        if updates.is_empty() {
            return Err(Error::Validation("Updates list must not be empty".to_string()));
        }

        updates
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let user_id = item
                    .user_id
                    .as_deref()
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .ok_or_else(|| {
                        Error::Validation(format!("Update {} is missing userId", index))
                    })?;
                let raw = item.max_emails.as_ref().ok_or_else(|| {
                    Error::Validation(format!("Update {} is missing maxEmails", index))
                })?;
                let max_emails = self.check_json(raw).map_err(|e| match e {
                    Error::Validation(msg) => {
                        Error::Validation(format!("Update {}: {}", index, msg))
                    }
                    other => other,
                })?;
                Ok(QuotaUpdate {
                    user_id: user_id.to_string(),
                    max_emails,
                })
            })
            .collect()
    }

    fn out_of_range(&self) -> Error {
        Error::Validation(format!(
            "maxEmails must be an integer between 0 and {}",
            self.ceiling
        ))
    }
}

/// Interpret a JSON value as an integer quota; floats with a fraction and
/// non-numbers are rejected.
pub fn json_integer(value: &Value) -> Result<i64> {
    let not_integer = || Error::Validation("maxEmails must be an integer".to_string());
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else if n.as_u64().is_some() {
                // Above i64::MAX, certainly out of range
                Ok(i64::MAX)
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.is_finite() => Ok(f as i64),
                    _ => Err(not_integer()),
                }
            }
        }
        _ => Err(not_integer()),
    }
}

/// One batch item as it arrives on the wire
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawQuotaUpdate {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub max_emails: Option<Value>,
}

/// A batch item that passed the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaUpdate {
    /// Opaque id as supplied; resolved against the store at apply time
    pub user_id: String,
    pub max_emails: i32,
}
