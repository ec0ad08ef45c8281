//! Selector and verifier halves of a split token.

use base64ct::{Base64UrlUnpadded, Encoding};
use secrecy::{ExposeSecret, SecretBox};
use std::fmt;
use zeroize::Zeroize;

use super::error::TokenError;

/// Random bytes behind a selector.
pub const SELECTOR_LEN: usize = 16;
/// Random bytes behind a verifier.
pub const VERIFIER_LEN: usize = 32;

/// Length of a selector once base64url encoded (no padding).
pub(crate) const SELECTOR_ENCODED_LEN: usize = 22;
/// Length of a verifier once base64url encoded (no padding).
pub(crate) const VERIFIER_ENCODED_LEN: usize = 43;

/// Public lookup half of a split token.
///
/// Stored in clear and safe to log; it never authenticates anything on its own.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Selector(String);

impl Selector {
    pub(crate) fn from_bytes(bytes: &[u8; SELECTOR_LEN]) -> Self {
        Self(Base64UrlUnpadded::encode_string(bytes))
    }

    /// Parse an encoded selector, e.g. one read back from storage.
    ///
    /// # Errors
    /// Returns `TokenError::MalformedToken` unless the value is the canonical
    /// base64url encoding of exactly `SELECTOR_LEN` bytes.
    pub fn parse(value: &str) -> Result<Self, TokenError> {
        if value.len() != SELECTOR_ENCODED_LEN {
            return Err(TokenError::MalformedToken);
        }
        let mut bytes = [0u8; SELECTOR_LEN];
        let decoded = Base64UrlUnpadded::decode(value, &mut bytes)
            .map_err(|_| TokenError::MalformedToken)?;
        if decoded.len() != SELECTOR_LEN {
            return Err(TokenError::MalformedToken);
        }
        Ok(Self(value.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Secret half of a split token.
///
/// The bytes live in a `SecretBox` so they are wiped on drop, and neither
/// `Debug` nor any other formatter ever prints them.
pub struct Verifier(SecretBox<[u8; VERIFIER_LEN]>);

impl Verifier {
    /// Move bytes into a verifier, wiping the caller's copy.
    pub(crate) fn take(bytes: &mut [u8; VERIFIER_LEN]) -> Self {
        let secret = SecretBox::new(Box::new(*bytes));
        bytes.zeroize();
        Self(secret)
    }

    pub(crate) fn expose(&self) -> &[u8; VERIFIER_LEN] {
        self.0.expose_secret()
    }
}

impl fmt::Debug for Verifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Verifier([REDACTED])")
    }
}
