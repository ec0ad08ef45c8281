//! Side effects reported by workflow calls.
//!
//! Callers drain these into their own outbox, e.g. to revoke sessions after a
//! password change.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConfirmationEvent {
    PasswordResetRequested {
        subject_id: Uuid,
        expires_at: DateTime<Utc>,
    },
    EmailChangeRequested {
        subject_id: Uuid,
        new_email: String,
        expires_at: DateTime<Utc>,
    },
    PasswordChanged {
        subject_id: Uuid,
    },
    EmailChanged {
        subject_id: Uuid,
        email: String,
    },
}

/// Why a token was turned down. Logged only; callers see `TokenNotAccepted`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Rejection {
    UnknownSelector,
    Expired,
    VerifierMismatch,
    PurposeMismatch,
    SubjectNotFound,
    EmailTaken,
    AlreadyConsumed,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::UnknownSelector => "unknown_selector",
            Self::Expired => "expired",
            Self::VerifierMismatch => "verifier_mismatch",
            Self::PurposeMismatch => "purpose_mismatch",
            Self::SubjectNotFound => "subject_not_found",
            Self::EmailTaken => "email_taken",
            Self::AlreadyConsumed => "already_consumed",
        };
        f.write_str(reason)
    }
}
