use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("malformed token")]
    MalformedToken,
    #[error("failed to draw random bytes")]
    Random,
    #[error("failed to hash verifier")]
    Hash,
    #[error("invalid hasher cost: {0}")]
    InvalidCost(String),
}
