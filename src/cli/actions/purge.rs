use super::PgWorkflow;
use crate::confirm::Purpose;
use anyhow::Result;
use tracing::info;
use uuid::Uuid;

#[derive(Debug)]
pub struct Args;

#[derive(Debug)]
pub struct CancelArgs {
    pub subject_id: Uuid,
    pub purpose: Purpose,
}

/// Delete expired pending tokens.
///
/// # Errors
/// Returns an error if the store fails.
pub async fn execute(workflow: &PgWorkflow, _args: Args) -> Result<()> {
    let purged = workflow.purge_expired().await?;
    info!(purged, "purge complete");
    println!("{purged}");
    Ok(())
}

/// Withdraw a subject's pending request.
///
/// # Errors
/// Returns an error if the store fails.
pub async fn cancel(workflow: &PgWorkflow, args: CancelArgs) -> Result<()> {
    let removed = workflow.cancel(args.subject_id, args.purpose).await?;
    info!(subject_id = %args.subject_id, purpose = %args.purpose, removed, "cancel complete");
    Ok(())
}
