//! Token generation and parsing.

use rand::{RngCore, SeedableRng, rngs::OsRng, rngs::StdRng};
use std::sync::{Arc, Mutex};
use zeroize::Zeroize;

use super::codec;
use super::error::TokenError;
use super::hasher::VerifierHasher;
use super::value::SplitTokenValue;
use super::verifier::{SELECTOR_LEN, Selector, VERIFIER_LEN, Verifier};

/// Source of cryptographically secure random bytes.
pub trait RandomSource: Send + Sync {
    /// # Errors
    /// Returns `TokenError::Random` if the source cannot produce bytes.
    fn fill(&self, dest: &mut [u8]) -> Result<(), TokenError>;
}

/// Operating system randomness.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&self, dest: &mut [u8]) -> Result<(), TokenError> {
        OsRng.try_fill_bytes(dest).map_err(|_| TokenError::Random)
    }
}

/// Deterministic stream for reproducible tests and fixtures.
///
/// Predictable by construction. Never use it to issue real tokens;
/// `SplitTokenFactory::new` draws from `OsRandom`.
#[doc(hidden)]
pub struct SeededRandom(Mutex<StdRng>);

impl SeededRandom {
    #[must_use]
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self(Mutex::new(StdRng::from_seed(seed)))
    }
}

impl std::fmt::Debug for SeededRandom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SeededRandom")
    }
}

impl RandomSource for SeededRandom {
    fn fill(&self, dest: &mut [u8]) -> Result<(), TokenError> {
        let mut rng = self.0.lock().map_err(|_| TokenError::Random)?;
        rng.fill_bytes(dest);
        Ok(())
    }
}

/// Builds split tokens, either fresh or from a submitted string.
#[derive(Clone)]
pub struct SplitTokenFactory {
    hasher: Arc<dyn VerifierHasher>,
    random: Arc<dyn RandomSource>,
}

impl SplitTokenFactory {
    #[must_use]
    pub fn new(hasher: Arc<dyn VerifierHasher>) -> Self {
        Self {
            hasher,
            random: Arc::new(OsRandom),
        }
    }

    #[must_use]
    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    #[must_use]
    pub fn hasher(&self) -> &dyn VerifierHasher {
        self.hasher.as_ref()
    }

    /// Draw a new selector and verifier and hash the verifier for storage.
    ///
    /// # Errors
    /// Returns `TokenError::Random` or `TokenError::Hash` when randomness or
    /// hashing fails.
    pub fn generate(&self) -> Result<SplitTokenValue, TokenError> {
        let mut selector = [0u8; SELECTOR_LEN];
        self.random.fill(&mut selector)?;

        let mut verifier = [0u8; VERIFIER_LEN];
        if let Err(err) = self.random.fill(&mut verifier) {
            verifier.zeroize();
            return Err(err);
        }

        let selector = Selector::from_bytes(&selector);
        let verifier = Verifier::take(&mut verifier);
        let verifier_hash = self.hasher.hash(&verifier)?;

        Ok(SplitTokenValue::new(selector, verifier, Some(verifier_hash)))
    }

    /// Rebuild a token from user input. No hash is computed here.
    ///
    /// # Errors
    /// Returns `TokenError::MalformedToken` if the string does not decode.
    pub fn from_string(&self, token: &str) -> Result<SplitTokenValue, TokenError> {
        let (selector, verifier) = codec::decode(token.trim())?;
        Ok(SplitTokenValue::new(selector, verifier, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::hasher::{Argon2VerifierHasher, HasherCost};
    use secrecy::ExposeSecret;

    struct FailingRandom;

    impl RandomSource for FailingRandom {
        fn fill(&self, _dest: &mut [u8]) -> Result<(), TokenError> {
            Err(TokenError::Random)
        }
    }

    fn factory() -> Result<SplitTokenFactory, TokenError> {
        let hasher = Argon2VerifierHasher::new(HasherCost::new(1024, 1, 1))?;
        Ok(SplitTokenFactory::new(Arc::new(hasher)))
    }

    #[test]
    fn generate_produces_hash_that_matches() -> Result<(), TokenError> {
        let factory = factory()?;
        let token = factory.generate()?;
        let hash = token.verifier_hash().cloned();
        assert!(hash.is_some());
        if let Some(hash) = hash {
            assert!(token.matches(factory.hasher(), &hash));
        }
        Ok(())
    }

    #[test]
    fn separate_factories_do_not_share_a_stream() -> Result<(), TokenError> {
        let first = factory()?.generate()?;
        let second = factory()?.generate()?;
        assert_ne!(first.selector(), second.selector());

        let seeded = || {
            factory().map(|factory| factory.with_random(Arc::new(SeededRandom::from_seed([9; 32]))))
        };
        assert_eq!(
            seeded()?.generate()?.selector(),
            seeded()?.generate()?.selector()
        );
        Ok(())
    }

    #[test]
    fn generate_draws_distinct_tokens() -> Result<(), TokenError> {
        let factory = factory()?;
        let first = factory.generate()?;
        let second = factory.generate()?;
        assert_ne!(first.selector(), second.selector());
        assert_ne!(
            first.full_token().expose_secret(),
            second.full_token().expose_secret()
        );
        Ok(())
    }

    #[test]
    fn from_string_round_trips_generated_token() -> Result<(), TokenError> {
        let factory = factory()?;
        let issued = factory.generate()?;
        let parsed = factory.from_string(issued.full_token().expose_secret())?;
        assert_eq!(parsed.selector(), issued.selector());
        assert!(parsed.verifier_hash().is_none());
        assert_eq!(
            parsed.full_token().expose_secret(),
            issued.full_token().expose_secret()
        );

        let hash = issued.verifier_hash().cloned();
        if let Some(hash) = hash {
            assert!(parsed.matches(factory.hasher(), &hash));
        }
        Ok(())
    }

    #[test]
    fn from_string_trims_whitespace() -> Result<(), TokenError> {
        let factory = factory()?;
        let issued = factory.generate()?;
        let padded = format!("  {}\n", issued.full_token().expose_secret());
        let parsed = factory.from_string(&padded)?;
        assert_eq!(parsed.selector(), issued.selector());
        Ok(())
    }

    #[test]
    fn from_string_rejects_garbage() -> Result<(), TokenError> {
        let factory = factory()?;
        assert!(matches!(
            factory.from_string("not-a-token"),
            Err(TokenError::MalformedToken)
        ));
        Ok(())
    }

    #[test]
    fn seeded_random_is_reproducible() -> Result<(), TokenError> {
        let hasher: Arc<dyn VerifierHasher> =
            Arc::new(Argon2VerifierHasher::new(HasherCost::new(1024, 1, 1))?);
        let first = SplitTokenFactory::new(hasher.clone())
            .with_random(Arc::new(SeededRandom::from_seed([7u8; 32])))
            .generate()?;
        let second = SplitTokenFactory::new(hasher)
            .with_random(Arc::new(SeededRandom::from_seed([7u8; 32])))
            .generate()?;
        assert_eq!(first.selector(), second.selector());
        Ok(())
    }

    #[test]
    fn random_failure_propagates() -> Result<(), TokenError> {
        let factory = factory()?.with_random(Arc::new(FailingRandom));
        assert!(matches!(factory.generate(), Err(TokenError::Random)));
        Ok(())
    }
}
