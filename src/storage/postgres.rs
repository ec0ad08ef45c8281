//! Postgres-backed store and directory.
//!
//! Tables are described in `sql/schema.sql`. The unique constraint on
//! `(subject_id, purpose)` backs the one-request-per-subject rule.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::Instrument;
use uuid::Uuid;

use crate::confirm::{
    ApplyOutcome, PendingTokenRecord, PendingTokenStore, Purpose, Subject, SubjectChange,
    SubjectDirectory,
};
use crate::token::{Selector, VerifierHash};

#[derive(Clone, Debug)]
pub struct PgTokenStore {
    pool: PgPool,
}

impl PgTokenStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn record_from_row(row: &PgRow) -> Result<PendingTokenRecord> {
    let selector: String = row.try_get("selector")?;
    let purpose: String = row.try_get("purpose")?;
    Ok(PendingTokenRecord {
        selector: Selector::parse(&selector).context("stored selector is malformed")?,
        verifier_hash: VerifierHash::new(row.try_get("verifier_hash")?),
        expires_at: row.try_get("expires_at")?,
        subject_id: row.try_get("subject_id")?,
        purpose: Purpose::parse(&purpose)
            .ok_or_else(|| anyhow!("unknown stored purpose: {purpose}"))?,
        payload: row.try_get("payload")?,
    })
}

impl PendingTokenStore for PgTokenStore {
    async fn save(&self, record: PendingTokenRecord) -> Result<()> {
        // Replace in one statement so two valid tokens never coexist.
        let query = r"
            INSERT INTO pending_tokens
                (selector, verifier_hash, expires_at, subject_id, purpose, payload)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (subject_id, purpose) DO UPDATE
            SET selector = EXCLUDED.selector,
                verifier_hash = EXCLUDED.verifier_hash,
                expires_at = EXCLUDED.expires_at,
                payload = EXCLUDED.payload,
                created_at = NOW()
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        sqlx::query(query)
            .bind(record.selector.as_str())
            .bind(record.verifier_hash.as_str())
            .bind(record.expires_at)
            .bind(record.subject_id)
            .bind(record.purpose.as_str())
            .bind(record.payload.as_deref())
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to upsert pending token")?;
        Ok(())
    }

    async fn find_by_selector(&self, selector: &Selector) -> Result<Option<PendingTokenRecord>> {
        let query = r"
            SELECT selector, verifier_hash, expires_at, subject_id, purpose, payload
            FROM pending_tokens
            WHERE selector = $1
            LIMIT 1
        ";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(selector.as_str())
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup pending token")?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn delete_by_selector(&self, selector: &Selector) -> Result<bool> {
        // The affected-row count decides which of two racing confirmations wins.
        let query = "DELETE FROM pending_tokens WHERE selector = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(selector.as_str())
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to delete pending token")?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_for_subject(&self, subject_id: Uuid, purpose: Purpose) -> Result<bool> {
        let query = "DELETE FROM pending_tokens WHERE subject_id = $1 AND purpose = $2";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(subject_id)
            .bind(purpose.as_str())
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to delete pending token for subject")?;
        Ok(result.rows_affected() > 0)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let query = "DELETE FROM pending_tokens WHERE expires_at <= $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "DELETE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(now)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to purge expired pending tokens")?;
        Ok(result.rows_affected())
    }
}

/// Accounts in the application's `users` table.
#[derive(Clone, Debug)]
pub struct PgSubjectDirectory {
    pool: PgPool,
}

impl PgSubjectDirectory {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl SubjectDirectory for PgSubjectDirectory {
    async fn find(&self, id: Uuid) -> Result<Option<Subject>> {
        let query = "SELECT id, email FROM users WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup user")?;

        Ok(row.map(|row| Subject {
            id: row.get("id"),
            email: row.get("email"),
        }))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Subject>> {
        let query = "SELECT id, email FROM users WHERE email = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup user by email")?;

        Ok(row.map(|row| Subject {
            id: row.get("id"),
            email: row.get("email"),
        }))
    }

    async fn apply(&self, id: Uuid, change: &SubjectChange) -> Result<ApplyOutcome> {
        let (query, value) = match change {
            SubjectChange::PasswordHash(hash) => (
                r"
                UPDATE users
                SET password_hash = $2,
                    updated_at = NOW()
                WHERE id = $1
                ",
                hash.as_str(),
            ),
            SubjectChange::Email(email) => (
                r"
                UPDATE users
                SET email = $2,
                    email_verified_at = NOW(),
                    updated_at = NOW()
                WHERE id = $1
                ",
                email.as_str(),
            ),
        };
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(id)
            .bind(value)
            .execute(&self.pool)
            .instrument(span)
            .await;
        match result {
            Ok(done) if done.rows_affected() > 0 => Ok(ApplyOutcome::Applied),
            Ok(_) => Ok(ApplyOutcome::SubjectNotFound),
            Err(err) if is_unique_violation(&err) => Ok(ApplyOutcome::EmailTaken),
            Err(err) => Err(anyhow::Error::new(err).context("failed to update user")),
        }
    }
}
