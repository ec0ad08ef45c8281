use super::{emit, PgWorkflow};
use crate::confirm::IssueOutcome;
use anyhow::Result;
use tracing::info;
use uuid::Uuid;

#[derive(Debug)]
pub struct ResetArgs {
    pub email: String,
}

#[derive(Debug)]
pub struct EmailChangeArgs {
    pub subject_id: Uuid,
    pub new_email: String,
}

/// Issue a password reset.
///
/// # Errors
/// Returns an error if storage, hashing or mail fails.
pub async fn reset(workflow: &PgWorkflow, args: ResetArgs) -> Result<()> {
    match workflow.request_password_reset(&args.email).await? {
        IssueOutcome::Issued(receipt) => emit(&receipt.events),
        IssueOutcome::Noop => {
            // Same answer either way; the account may not exist.
            info!("password reset request accepted");
            Ok(())
        }
    }
}

/// Issue an email change.
///
/// # Errors
/// Returns an error if the address is invalid or taken, the subject is
/// unknown, or storage, hashing or mail fails.
pub async fn email_change(workflow: &PgWorkflow, args: EmailChangeArgs) -> Result<()> {
    let receipt = workflow
        .request_email_change(args.subject_id, &args.new_email)
        .await?;
    emit(&receipt.events)
}
