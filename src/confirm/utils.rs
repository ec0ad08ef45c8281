//! Small helpers for address validation, links and password hashing.

use anyhow::{Result, anyhow};
use argon2::{Algorithm, Argon2, PasswordHasher, Version, password_hash::SaltString};
use rand::rngs::OsRng;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};

use crate::token::HasherCost;

use super::record::Purpose;

/// Normalize an email for lookup/uniqueness checks.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub(crate) fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

/// Build the frontend confirmation link included in outbound emails.
pub(crate) fn build_confirm_url(frontend_base_url: &str, purpose: Purpose, token: &str) -> String {
    let base = frontend_base_url.trim_end_matches('/');
    let path = match purpose {
        Purpose::PasswordReset => "password-reset",
        Purpose::EmailChange => "email-change",
    };
    format!("{base}/{path}/confirm/{token}")
}

/// Hash a new account password as an Argon2id PHC string.
pub(crate) fn hash_new_password(password: &SecretString, cost: HasherCost) -> Result<String> {
    let params = cost.params()?;
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let hash = argon2
        .hash_password(password.expose_secret().as_bytes(), &salt)
        .map_err(|_| anyhow!("failed to hash new password"))?
        .to_string();
    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::{PasswordHash, PasswordVerifier};

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email(" Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@example.com"));
        assert!(valid_email("name.surname@example.co"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("missing-domain@"));
    }

    #[test]
    fn build_confirm_url_trims_trailing_slash() {
        assert_eq!(
            build_confirm_url("https://permesi.dev/", Purpose::PasswordReset, "token"),
            "https://permesi.dev/password-reset/confirm/token"
        );
        assert_eq!(
            build_confirm_url("https://permesi.dev", Purpose::EmailChange, "token"),
            "https://permesi.dev/email-change/confirm/token"
        );
    }

    #[test]
    fn hash_new_password_verifies() -> Result<()> {
        let password = SecretString::from("correct horse".to_string());
        let hash = hash_new_password(&password, HasherCost::new(1024, 1, 1))?;
        let parsed = PasswordHash::new(&hash).map_err(|err| anyhow!(err.to_string()))?;
        assert!(Argon2::default()
            .verify_password(b"correct horse", &parsed)
            .is_ok());
        assert!(Argon2::default()
            .verify_password(b"wrong horse", &parsed)
            .is_err());
        Ok(())
    }
}
