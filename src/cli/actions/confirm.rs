use super::{emit, PgWorkflow};
use anyhow::Result;
use secrecy::{ExposeSecret, SecretString};

#[derive(Debug)]
pub struct ResetArgs {
    pub token: SecretString,
    pub new_password: SecretString,
}

#[derive(Debug)]
pub struct EmailArgs {
    pub token: SecretString,
}

/// Redeem a password reset token.
///
/// # Errors
/// Returns an error if the password is too weak or the token is not accepted.
pub async fn reset(workflow: &PgWorkflow, args: ResetArgs) -> Result<()> {
    let confirmation = workflow
        .confirm_password_reset(args.token.expose_secret(), &args.new_password)
        .await?;
    emit(&confirmation.events)
}

/// Redeem an email change token.
///
/// # Errors
/// Returns an error if the token is not accepted.
pub async fn email(workflow: &PgWorkflow, args: EmailArgs) -> Result<()> {
    let confirmation = workflow
        .confirm_email_change(args.token.expose_secret())
        .await?;
    emit(&confirmation.events)
}
