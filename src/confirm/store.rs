//! Collaborators the workflow persists through.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::future::Future;
use uuid::Uuid;

use crate::token::Selector;

use super::record::{PendingTokenRecord, Purpose};

/// Storage for pending token records.
///
/// Implementations must keep at most one record per subject and purpose.
pub trait PendingTokenStore: Send + Sync {
    /// Insert a record, replacing any record for the same subject and purpose.
    fn save(&self, record: PendingTokenRecord) -> impl Future<Output = Result<()>> + Send;

    fn find_by_selector(
        &self,
        selector: &Selector,
    ) -> impl Future<Output = Result<Option<PendingTokenRecord>>> + Send;

    /// Delete by selector and report whether a record was removed. Only one of
    /// several concurrent callers may observe `true`.
    fn delete_by_selector(&self, selector: &Selector) -> impl Future<Output = Result<bool>> + Send;

    fn delete_for_subject(
        &self,
        subject_id: Uuid,
        purpose: Purpose,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Delete every record expired at `now`, returning how many were removed.
    fn purge_expired(&self, now: DateTime<Utc>) -> impl Future<Output = Result<u64>> + Send;
}

/// Account a token acts on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Subject {
    pub id: Uuid,
    pub email: String,
}

/// State change applied once a token is confirmed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubjectChange {
    /// PHC string of the new password.
    PasswordHash(String),
    /// New, already normalized, email address.
    Email(String),
}

/// Result of applying a confirmed change to a subject.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    SubjectNotFound,
    /// Another subject already owns the requested address.
    EmailTaken,
}

/// The application's account storage.
pub trait SubjectDirectory: Send + Sync {
    fn find(&self, id: Uuid) -> impl Future<Output = Result<Option<Subject>>> + Send;

    fn find_by_email(&self, email: &str) -> impl Future<Output = Result<Option<Subject>>> + Send;

    /// Apply a change. Email changes must fail with `EmailTaken`, not an
    /// error, when another subject holds the address.
    fn apply(
        &self,
        id: Uuid,
        change: &SubjectChange,
    ) -> impl Future<Output = Result<ApplyOutcome>> + Send;
}
