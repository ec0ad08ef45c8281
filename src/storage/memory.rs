//! In-process store and directory, for tests and embedding.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::confirm::{
    ApplyOutcome, PendingTokenRecord, PendingTokenStore, Purpose, Subject, SubjectChange,
    SubjectDirectory,
};
use crate::token::Selector;

/// Pending tokens keyed by selector behind a single lock, which makes
/// replace-on-save and claim-by-delete atomic.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    records: Mutex<HashMap<Selector, PendingTokenRecord>>,
}

impl MemoryTokenStore {
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

impl PendingTokenStore for MemoryTokenStore {
    async fn save(&self, record: PendingTokenRecord) -> Result<()> {
        let mut records = self.records.lock().await;
        records.retain(|_, existing| {
            existing.subject_id != record.subject_id || existing.purpose != record.purpose
        });
        if records.contains_key(&record.selector) {
            return Err(anyhow!("selector collision"));
        }
        records.insert(record.selector.clone(), record);
        Ok(())
    }

    async fn find_by_selector(&self, selector: &Selector) -> Result<Option<PendingTokenRecord>> {
        Ok(self.records.lock().await.get(selector).cloned())
    }

    async fn delete_by_selector(&self, selector: &Selector) -> Result<bool> {
        Ok(self.records.lock().await.remove(selector).is_some())
    }

    async fn delete_for_subject(&self, subject_id: Uuid, purpose: Purpose) -> Result<bool> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|_, existing| {
            existing.subject_id != subject_id || existing.purpose != purpose
        });
        Ok(records.len() < before)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|_, existing| !existing.is_expired(now));
        Ok(u64::try_from(before - records.len()).unwrap_or(u64::MAX))
    }
}

#[derive(Clone, Debug)]
struct Account {
    email: String,
    password_hash: Option<String>,
}

/// Accounts keyed by id.
#[derive(Debug, Default)]
pub struct MemorySubjectDirectory {
    accounts: Mutex<HashMap<Uuid, Account>>,
}

impl MemorySubjectDirectory {
    /// Add an account and return its id.
    pub async fn insert(&self, email: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.accounts.lock().await.insert(
            id,
            Account {
                email: email.to_string(),
                password_hash: None,
            },
        );
        id
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.accounts.lock().await.remove(&id).is_some()
    }

    pub async fn email(&self, id: Uuid) -> Option<String> {
        self.accounts
            .lock()
            .await
            .get(&id)
            .map(|account| account.email.clone())
    }

    pub async fn password_hash(&self, id: Uuid) -> Option<String> {
        self.accounts
            .lock()
            .await
            .get(&id)
            .and_then(|account| account.password_hash.clone())
    }
}

impl SubjectDirectory for MemorySubjectDirectory {
    async fn find(&self, id: Uuid) -> Result<Option<Subject>> {
        Ok(self.accounts.lock().await.get(&id).map(|account| Subject {
            id,
            email: account.email.clone(),
        }))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Subject>> {
        Ok(self
            .accounts
            .lock()
            .await
            .iter()
            .find(|(_, account)| account.email == email)
            .map(|(id, account)| Subject {
                id: *id,
                email: account.email.clone(),
            }))
    }

    async fn apply(&self, id: Uuid, change: &SubjectChange) -> Result<ApplyOutcome> {
        let mut accounts = self.accounts.lock().await;
        // Checked under the same lock as the write, like a unique index.
        if let SubjectChange::Email(email) = change {
            let taken = accounts
                .iter()
                .any(|(other, account)| *other != id && account.email == *email);
            if taken && accounts.contains_key(&id) {
                return Ok(ApplyOutcome::EmailTaken);
            }
        }
        let Some(account) = accounts.get_mut(&id) else {
            return Ok(ApplyOutcome::SubjectNotFound);
        };
        match change {
            SubjectChange::PasswordHash(hash) => account.password_hash = Some(hash.clone()),
            SubjectChange::Email(email) => account.email.clone_from(email),
        }
        Ok(ApplyOutcome::Applied)
    }
}
