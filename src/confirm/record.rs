//! Pending confirmation requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::token::{Selector, VerifierHash};

/// What a pending request authorizes once confirmed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    PasswordReset,
    EmailChange,
}

impl Purpose {
    /// Stable name used in storage.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PasswordReset => "password_reset",
            Self::EmailChange => "email_change",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "password_reset" => Some(Self::PasswordReset),
            "email_change" => Some(Self::EmailChange),
            _ => None,
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted half of a split token.
///
/// Records are never updated in place: a new request for the same subject and
/// purpose replaces the old record, and confirmation deletes it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingTokenRecord {
    pub selector: Selector,
    pub verifier_hash: VerifierHash,
    pub expires_at: DateTime<Utc>,
    pub subject_id: Uuid,
    pub purpose: Purpose,
    /// Requested new address for `Purpose::EmailChange`.
    pub payload: Option<String>,
}

impl PendingTokenRecord {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
