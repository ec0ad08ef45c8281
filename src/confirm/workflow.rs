//! Issue and confirm split-token requests.
//!
//! Issue: generate a token, persist `{selector, hash(verifier), expires_at}`
//! replacing any earlier request for the same subject and purpose, then mail the
//! raw token. Confirm: parse the token, look the record up by selector, check
//! expiry, verifier and purpose, claim the record by deleting it, then apply the
//! change. Any failure after the lookup deletes the record, so a token gets a
//! single attempt.

use anyhow::{Context, anyhow};
use chrono::{DateTime, TimeDelta, Utc};
use secrecy::{ExposeSecret, SecretString};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::token::{Selector, SplitTokenFactory, SplitTokenValue, VerifierHash};

use super::clock::Clock;
use super::config::ConfirmationConfig;
use super::error::{ConfirmError, IssueError};
use super::event::{ConfirmationEvent, Rejection};
use super::mailer::{ConfirmationMail, Mailer};
use super::record::{PendingTokenRecord, Purpose};
use super::store::{ApplyOutcome, PendingTokenStore, Subject, SubjectChange, SubjectDirectory};
use super::utils::{build_confirm_url, hash_new_password, normalize_email, valid_email};

/// Result of a successful issue.
#[derive(Debug)]
pub struct IssueReceipt {
    pub subject_id: Uuid,
    pub purpose: Purpose,
    pub selector: Selector,
    pub expires_at: DateTime<Utc>,
    pub events: Vec<ConfirmationEvent>,
}

/// Outcome for requests that must not reveal whether an account exists.
#[derive(Debug)]
pub enum IssueOutcome {
    Issued(IssueReceipt),
    Noop,
}

/// Result of a successful confirmation.
#[derive(Debug)]
pub struct Confirmation {
    pub subject_id: Uuid,
    pub purpose: Purpose,
    pub events: Vec<ConfirmationEvent>,
}

pub struct ConfirmationWorkflow<S, D> {
    config: ConfirmationConfig,
    factory: SplitTokenFactory,
    store: S,
    directory: D,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
    decoy: OnceLock<VerifierHash>,
}

impl<S, D> ConfirmationWorkflow<S, D>
where
    S: PendingTokenStore,
    D: SubjectDirectory,
{
    pub fn new(
        config: ConfirmationConfig,
        factory: SplitTokenFactory,
        store: S,
        directory: D,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            factory,
            store,
            directory,
            mailer,
            clock,
            decoy: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ConfirmationConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Start a password reset for the account owning `email`.
    ///
    /// Unknown or invalid addresses yield `IssueOutcome::Noop` so callers can
    /// answer identically either way.
    ///
    /// # Errors
    /// Returns `IssueError::Infrastructure` if storage, hashing or mail fails.
    pub async fn request_password_reset(&self, email: &str) -> Result<IssueOutcome, IssueError> {
        let email = normalize_email(email);
        if !valid_email(&email) {
            debug!("password reset requested for invalid address");
            self.spend_hash();
            return Ok(IssueOutcome::Noop);
        }

        let subject = self
            .directory
            .find_by_email(&email)
            .await
            .context("failed to look up subject by email")?;
        let Some(subject) = subject else {
            debug!("password reset requested for unknown address");
            self.spend_hash();
            return Ok(IssueOutcome::Noop);
        };

        let receipt = self.issue(&subject, Purpose::PasswordReset, None).await?;
        Ok(IssueOutcome::Issued(receipt))
    }

    /// Start an email change; the link goes to the new address.
    ///
    /// # Errors
    /// Returns `InvalidEmail`, `SubjectNotFound` or `EmailInUse` for bad
    /// requests, `Infrastructure` if storage, hashing or mail fails.
    pub async fn request_email_change(
        &self,
        subject_id: Uuid,
        new_email: &str,
    ) -> Result<IssueReceipt, IssueError> {
        let new_email = normalize_email(new_email);
        if !valid_email(&new_email) {
            return Err(IssueError::InvalidEmail);
        }

        let subject = self
            .directory
            .find(subject_id)
            .await
            .context("failed to look up subject")?
            .ok_or(IssueError::SubjectNotFound)?;

        let owner = self
            .directory
            .find_by_email(&new_email)
            .await
            .context("failed to look up subject by email")?;
        if owner.is_some() {
            return Err(IssueError::EmailInUse);
        }

        let recipient = Subject {
            id: subject.id,
            email: new_email.clone(),
        };
        self.issue(&recipient, Purpose::EmailChange, Some(new_email))
            .await
    }

    /// Issue a token for `subject` and mail it to `subject.email`.
    ///
    /// Replaces any pending request for the same subject and purpose.
    ///
    /// # Errors
    /// Returns `IssueError::Infrastructure` if token generation, storage or
    /// mail delivery fails.
    pub async fn issue(
        &self,
        subject: &Subject,
        purpose: Purpose,
        payload: Option<String>,
    ) -> Result<IssueReceipt, IssueError> {
        let token = self.factory.generate()?;
        let verifier_hash = token
            .verifier_hash()
            .cloned()
            .ok_or_else(|| anyhow!("generated token has no verifier hash"))?;

        let ttl = TimeDelta::try_seconds(self.config.ttl_seconds(purpose))
            .ok_or_else(|| anyhow!("invalid {purpose} ttl"))?;
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(ttl)
            .ok_or_else(|| anyhow!("{purpose} expiry out of range"))?;

        let record = PendingTokenRecord {
            selector: token.selector().clone(),
            verifier_hash,
            expires_at,
            subject_id: subject.id,
            purpose,
            payload: payload.clone(),
        };
        self.store
            .save(record)
            .await
            .context("failed to save pending token")?;

        let raw = token.full_token().expose_secret();
        let mail = ConfirmationMail {
            to_email: subject.email.clone(),
            purpose,
            token: SecretString::from(raw.to_string()),
            confirm_url: SecretString::from(build_confirm_url(
                self.config.frontend_base_url(),
                purpose,
                raw,
            )),
            expires_at,
        };
        self.mailer
            .send(&mail)
            .context("failed to send confirmation mail")?;

        info!(
            subject_id = %subject.id,
            purpose = %purpose,
            selector = %token.selector(),
            "confirmation token issued"
        );

        let event = match purpose {
            Purpose::PasswordReset => ConfirmationEvent::PasswordResetRequested {
                subject_id: subject.id,
                expires_at,
            },
            Purpose::EmailChange => ConfirmationEvent::EmailChangeRequested {
                subject_id: subject.id,
                new_email: payload.unwrap_or_else(|| subject.email.clone()),
                expires_at,
            },
        };

        Ok(IssueReceipt {
            subject_id: subject.id,
            purpose,
            selector: token.selector().clone(),
            expires_at,
            events: vec![event],
        })
    }

    /// Confirm a password reset and store the new password.
    ///
    /// The password policy is checked and the new password hashed before the
    /// token is looked at, so neither a rejected password nor a hashing
    /// failure burns the token.
    ///
    /// # Errors
    /// Returns `PasswordPolicy`, `MalformedToken` or `TokenNotAccepted`, or
    /// `Infrastructure` if storage or hashing fails.
    pub async fn confirm_password_reset(
        &self,
        token: &str,
        new_password: &SecretString,
    ) -> Result<Confirmation, ConfirmError> {
        let min_length = self.config.min_password_length();
        if new_password.expose_secret().chars().count() < min_length {
            return Err(ConfirmError::PasswordPolicy(min_length));
        }

        let password_hash = hash_new_password(new_password, self.config.password_hash_cost())?;
        let record = self.consume(Purpose::PasswordReset, token).await?;
        self.apply(&record, &SubjectChange::PasswordHash(password_hash))
            .await?;

        info!(subject_id = %record.subject_id, "password reset confirmed");

        Ok(Confirmation {
            subject_id: record.subject_id,
            purpose: record.purpose,
            events: vec![ConfirmationEvent::PasswordChanged {
                subject_id: record.subject_id,
            }],
        })
    }

    /// Confirm an email change and switch the subject to the new address.
    ///
    /// If another subject took the address after the request, the token is
    /// rejected and its record deleted.
    ///
    /// # Errors
    /// Returns `MalformedToken` or `TokenNotAccepted`, or `Infrastructure` if
    /// storage fails or the record carries no address.
    pub async fn confirm_email_change(&self, token: &str) -> Result<Confirmation, ConfirmError> {
        let record = self.consume(Purpose::EmailChange, token).await?;
        let email = record
            .payload
            .clone()
            .ok_or_else(|| anyhow!("email change request has no address"))?;
        self.apply(&record, &SubjectChange::Email(email.clone()))
            .await?;

        info!(subject_id = %record.subject_id, "email change confirmed");

        Ok(Confirmation {
            subject_id: record.subject_id,
            purpose: record.purpose,
            events: vec![ConfirmationEvent::EmailChanged {
                subject_id: record.subject_id,
                email,
            }],
        })
    }

    /// Drop the pending request of a subject, if any.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub async fn cancel(&self, subject_id: Uuid, purpose: Purpose) -> anyhow::Result<bool> {
        self.store
            .delete_for_subject(subject_id, purpose)
            .await
            .context("failed to cancel pending token")
    }

    /// Delete every expired request.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub async fn purge_expired(&self) -> anyhow::Result<u64> {
        let purged = self
            .store
            .purge_expired(self.clock.now())
            .await
            .context("failed to purge expired tokens")?;
        debug!(purged, "expired pending tokens purged");
        Ok(purged)
    }

    /// Validate a submitted token and claim its record.
    async fn consume(
        &self,
        purpose: Purpose,
        token: &str,
    ) -> Result<PendingTokenRecord, ConfirmError> {
        // Parse failures happen before any lookup and leave storage untouched.
        let candidate = self.factory.from_string(token)?;
        let selector = candidate.selector().clone();

        let record = self
            .store
            .find_by_selector(&selector)
            .await
            .context("failed to look up pending token")?;
        let Some(record) = record else {
            // Same hashing work as a known selector.
            self.decoy_verify(&candidate);
            return Err(reject(&selector, Rejection::UnknownSelector));
        };

        let mut rejection = if record.is_expired(self.clock.now()) {
            Some(Rejection::Expired)
        } else if !candidate.matches(self.factory.hasher(), &record.verifier_hash) {
            Some(Rejection::VerifierMismatch)
        } else if record.purpose != purpose {
            Some(Rejection::PurposeMismatch)
        } else {
            None
        };
        drop(candidate);

        if rejection.is_none() && record.purpose == Purpose::EmailChange {
            rejection = self.email_taken(&record).await?;
        }

        if let Some(reason) = rejection {
            self.store
                .delete_by_selector(&selector)
                .await
                .context("failed to delete rejected pending token")?;
            return Err(reject(&selector, reason));
        }

        // Only the caller whose delete removes the row may apply the change.
        let claimed = self
            .store
            .delete_by_selector(&selector)
            .await
            .context("failed to claim pending token")?;
        if !claimed {
            return Err(reject(&selector, Rejection::AlreadyConsumed));
        }

        Ok(record)
    }

    async fn apply(
        &self,
        record: &PendingTokenRecord,
        change: &SubjectChange,
    ) -> Result<(), ConfirmError> {
        let outcome = self
            .directory
            .apply(record.subject_id, change)
            .await
            .context("failed to apply confirmed change")?;
        match outcome {
            ApplyOutcome::Applied => Ok(()),
            ApplyOutcome::SubjectNotFound => {
                Err(reject(&record.selector, Rejection::SubjectNotFound))
            }
            ApplyOutcome::EmailTaken => Err(reject(&record.selector, Rejection::EmailTaken)),
        }
    }

    /// Whether the address an email change asks for now belongs to someone else.
    async fn email_taken(
        &self,
        record: &PendingTokenRecord,
    ) -> Result<Option<Rejection>, ConfirmError> {
        let Some(email) = record.payload.as_deref() else {
            return Ok(None);
        };
        let owner = self
            .directory
            .find_by_email(email)
            .await
            .context("failed to look up subject by email")?;
        Ok(owner
            .filter(|owner| owner.id != record.subject_id)
            .map(|_| Rejection::EmailTaken))
    }

    /// Hash a throwaway verifier so requests for unknown addresses cost the
    /// same as real ones.
    fn spend_hash(&self) {
        if self.factory.generate().is_err() {
            debug!("decoy token generation failed");
        }
    }

    /// Verify against a fixed decoy hash so unknown selectors cost the same as
    /// known ones.
    fn decoy_verify(&self, candidate: &SplitTokenValue) {
        let decoy = match self.decoy.get() {
            Some(hash) => hash,
            None => {
                let Some(hash) = self
                    .factory
                    .generate()
                    .ok()
                    .and_then(|token| token.verifier_hash().cloned())
                else {
                    debug!("decoy hash unavailable");
                    return;
                };
                self.decoy.get_or_init(|| hash)
            }
        };
        let _ = candidate.matches(self.factory.hasher(), decoy);
    }
}

fn reject(selector: &Selector, reason: Rejection) -> ConfirmError {
    warn!(selector = %selector, reason = %reason, "confirmation token rejected");
    ConfirmError::TokenNotAccepted
}
