pub mod confirm;
pub mod purge;
pub mod request;

use crate::cli::globals::GlobalArgs;
use crate::confirm::{ConfirmationEvent, ConfirmationWorkflow, LogMailer, SystemClock};
use crate::storage::{PgSubjectDirectory, PgTokenStore};
use crate::token::{Argon2VerifierHasher, SplitTokenFactory};
use anyhow::{Context, Result};
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tracing::debug;

pub type PgWorkflow = ConfirmationWorkflow<PgTokenStore, PgSubjectDirectory>;

#[derive(Debug)]
pub enum Action {
    RequestReset(request::ResetArgs),
    RequestEmailChange(request::EmailChangeArgs),
    ConfirmReset(confirm::ResetArgs),
    ConfirmEmail(confirm::EmailArgs),
    Cancel(purge::CancelArgs),
    Purge(purge::Args),
}

impl Action {
    /// Run the action against the configured database.
    ///
    /// # Errors
    /// Returns an error if the database is unreachable or the action fails.
    pub async fn execute(self, globals: &GlobalArgs) -> Result<()> {
        let workflow = connect(globals).await?;
        match self {
            Self::RequestReset(args) => request::reset(&workflow, args).await,
            Self::RequestEmailChange(args) => request::email_change(&workflow, args).await,
            Self::ConfirmReset(args) => confirm::reset(&workflow, args).await,
            Self::ConfirmEmail(args) => confirm::email(&workflow, args).await,
            Self::Cancel(args) => purge::cancel(&workflow, args).await,
            Self::Purge(args) => purge::execute(&workflow, args).await,
        }
    }
}

/// Wire the workflow to Postgres, the log mailer and the system clock.
///
/// # Errors
/// Returns an error if the hasher parameters are invalid or the pool cannot connect.
pub async fn connect(globals: &GlobalArgs) -> Result<PgWorkflow> {
    // One cost flag drives both verifier and password hashing.
    let cost = globals.config.password_hash_cost();
    let hasher = match &globals.pepper {
        Some(pepper) => Argon2VerifierHasher::with_pepper(cost, pepper.expose_secret().as_bytes()),
        None => Argon2VerifierHasher::new(cost),
    }
    .context("invalid argon2 parameters")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect(globals.dsn.expose_secret())
        .await
        .context("failed to connect to database")?;
    debug!("database pool ready");

    Ok(ConfirmationWorkflow::new(
        globals.config.clone(),
        SplitTokenFactory::new(Arc::new(hasher)),
        PgTokenStore::new(pool.clone()),
        PgSubjectDirectory::new(pool),
        Arc::new(LogMailer),
        Arc::new(SystemClock),
    ))
}

/// Print domain events as JSON lines for the caller to forward.
///
/// # Errors
/// Returns an error if an event does not serialize.
pub fn emit(events: &[ConfirmationEvent]) -> Result<()> {
    for event in events {
        println!("{}", serde_json::to_string(event)?);
    }
    Ok(())
}
