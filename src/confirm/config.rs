//! Confirmation workflow configuration.

use crate::token::HasherCost;

use super::record::Purpose;

const DEFAULT_PASSWORD_RESET_TTL_SECONDS: i64 = 60 * 60;
const DEFAULT_EMAIL_CHANGE_TTL_SECONDS: i64 = 24 * 60 * 60;
const DEFAULT_MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Clone, Debug)]
pub struct ConfirmationConfig {
    frontend_base_url: String,
    password_reset_ttl_seconds: i64,
    email_change_ttl_seconds: i64,
    min_password_length: usize,
    password_hash_cost: HasherCost,
}

impl ConfirmationConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            password_reset_ttl_seconds: DEFAULT_PASSWORD_RESET_TTL_SECONDS,
            email_change_ttl_seconds: DEFAULT_EMAIL_CHANGE_TTL_SECONDS,
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
            password_hash_cost: HasherCost::default(),
        }
    }

    #[must_use]
    pub fn with_password_reset_ttl_seconds(mut self, seconds: i64) -> Self {
        self.password_reset_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_email_change_ttl_seconds(mut self, seconds: i64) -> Self {
        self.email_change_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_min_password_length(mut self, length: usize) -> Self {
        self.min_password_length = length;
        self
    }

    /// Argon2 cost for hashing new account passwords.
    ///
    /// Verifier hashing is configured on the `SplitTokenFactory`'s hasher and
    /// is not affected.
    #[must_use]
    pub fn with_password_hash_cost(mut self, cost: HasherCost) -> Self {
        self.password_hash_cost = cost;
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub fn ttl_seconds(&self, purpose: Purpose) -> i64 {
        match purpose {
            Purpose::PasswordReset => self.password_reset_ttl_seconds,
            Purpose::EmailChange => self.email_change_ttl_seconds,
        }
    }

    #[must_use]
    pub fn min_password_length(&self) -> usize {
        self.min_password_length
    }

    #[must_use]
    pub fn password_hash_cost(&self) -> HasherCost {
        self.password_hash_cost
    }
}
