use thiserror::Error;

use crate::token::TokenError;

/// Failures while starting a confirmation request.
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("invalid email address")]
    InvalidEmail,
    #[error("subject not found")]
    SubjectNotFound,
    #[error("email address already in use")]
    EmailInUse,
    #[error(transparent)]
    Infrastructure(#[from] anyhow::Error),
}

impl From<TokenError> for IssueError {
    fn from(err: TokenError) -> Self {
        Self::Infrastructure(err.into())
    }
}

/// Failures while confirming a token.
///
/// `TokenNotAccepted` deliberately covers unknown, expired, mismatched and
/// already used tokens alike.
#[derive(Debug, Error)]
pub enum ConfirmError {
    #[error("malformed token")]
    MalformedToken,
    #[error("token not accepted")]
    TokenNotAccepted,
    #[error("new password must be at least {0} characters")]
    PasswordPolicy(usize),
    #[error(transparent)]
    Infrastructure(#[from] anyhow::Error),
}

impl From<TokenError> for ConfirmError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::MalformedToken => Self::MalformedToken,
            other => Self::Infrastructure(other.into()),
        }
    }
}
