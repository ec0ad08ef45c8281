use secrecy::SecretString;
use std::fmt;

use super::codec;
use super::hasher::{VerifierHash, VerifierHasher};
use super::verifier::{Selector, Verifier};

/// In-memory split token: a fresh one from the factory, or one rebuilt from a
/// user submission.
///
/// Fresh tokens carry the verifier hash to persist; parsed tokens do not, they
/// are checked against the stored hash instead. The verifier and the full
/// token are wiped when the value is dropped.
pub struct SplitTokenValue {
    selector: Selector,
    verifier: Verifier,
    verifier_hash: Option<VerifierHash>,
    full_token: SecretString,
}

impl SplitTokenValue {
    pub(crate) fn new(
        selector: Selector,
        verifier: Verifier,
        verifier_hash: Option<VerifierHash>,
    ) -> Self {
        let full_token = codec::encode(&selector, &verifier);
        Self {
            selector,
            verifier,
            verifier_hash,
            full_token,
        }
    }

    #[must_use]
    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    #[must_use]
    pub fn verifier_hash(&self) -> Option<&VerifierHash> {
        self.verifier_hash.as_ref()
    }

    /// The token to deliver to the user. Expose it only to build the link.
    #[must_use]
    pub fn full_token(&self) -> &SecretString {
        &self.full_token
    }

    /// Whether this token's verifier matches a stored hash.
    pub fn matches<H>(&self, hasher: &H, stored: &VerifierHash) -> bool
    where
        H: VerifierHasher + ?Sized,
    {
        hasher.verify(stored, &self.verifier)
    }
}

impl fmt::Debug for SplitTokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplitTokenValue")
            .field("selector", &self.selector)
            .field("verifier", &self.verifier)
            .field("verifier_hash", &self.verifier_hash)
            .field("full_token", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::hasher::{Argon2VerifierHasher, HasherCost};
    use crate::token::verifier::{SELECTOR_LEN, VERIFIER_LEN};
    use crate::token::TokenError;
    use secrecy::ExposeSecret;

    fn value(fill: u8) -> SplitTokenValue {
        SplitTokenValue::new(
            Selector::from_bytes(&[fill; SELECTOR_LEN]),
            Verifier::take(&mut [fill; VERIFIER_LEN]),
            None,
        )
    }

    #[test]
    fn full_token_encodes_both_halves() {
        let token = value(3);
        let decoded = codec::decode(token.full_token().expose_secret());
        assert!(matches!(decoded, Ok((ref selector, _)) if selector == token.selector()));
    }

    #[test]
    fn matches_delegates_to_hasher() -> Result<(), TokenError> {
        let hasher = Argon2VerifierHasher::new(HasherCost::new(1024, 1, 1))?;
        let issued = value(5);
        let hash = hasher.hash(&issued.verifier)?;
        assert!(issued.matches(&hasher, &hash));
        assert!(!value(6).matches(&hasher, &hash));
        Ok(())
    }

    #[test]
    fn debug_hides_secrets() {
        let token = value(8);
        let rendered = format!("{token:?}");
        assert!(rendered.contains(token.selector().as_str()));
        assert!(!rendered.contains(token.full_token().expose_secret()));
        assert!(rendered.contains("[REDACTED]"));
    }
}
