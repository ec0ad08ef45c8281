//! One-way hashing of verifiers.
//!
//! Only the hash of a verifier is ever persisted. The default strategy is
//! Argon2id with deployment-tunable cost and an optional server-side pepper.

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand::rngs::OsRng;
use secrecy::{ExposeSecret, SecretBox};

use super::error::TokenError;
use super::verifier::Verifier;

/// Argon2 cost parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HasherCost {
    memory_kib: u32,
    iterations: u32,
    parallelism: u32,
}

impl HasherCost {
    #[must_use]
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Self {
        Self {
            memory_kib,
            iterations,
            parallelism,
        }
    }

    #[must_use]
    pub fn memory_kib(&self) -> u32 {
        self.memory_kib
    }

    #[must_use]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    #[must_use]
    pub fn parallelism(&self) -> u32 {
        self.parallelism
    }

    /// Validate the cost and turn it into Argon2 parameters.
    ///
    /// # Errors
    /// Returns `TokenError::InvalidCost` when Argon2 rejects the combination.
    pub fn params(&self) -> Result<Params, TokenError> {
        Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|err| TokenError::InvalidCost(err.to_string()))
    }
}

impl Default for HasherCost {
    fn default() -> Self {
        Self::new(
            Params::DEFAULT_M_COST,
            Params::DEFAULT_T_COST,
            Params::DEFAULT_P_COST,
        )
    }
}

/// PHC-formatted hash of a verifier, as persisted next to its selector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifierHash(String);

impl VerifierHash {
    #[must_use]
    pub fn new(phc: String) -> Self {
        Self(phc)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Strategy for hashing and checking verifiers.
pub trait VerifierHasher: Send + Sync {
    /// Hash a verifier for storage.
    ///
    /// # Errors
    /// Returns `TokenError::Hash` if the primitive fails.
    fn hash(&self, verifier: &Verifier) -> Result<VerifierHash, TokenError>;

    /// Check a verifier against a stored hash.
    ///
    /// Malformed hashes are a non-match, never an error.
    fn verify(&self, hash: &VerifierHash, verifier: &Verifier) -> bool;
}

/// Argon2id verifier hasher.
///
/// Verification reads the cost from the stored PHC string, so retuning
/// `HasherCost` leaves outstanding tokens valid.
#[derive(Debug)]
pub struct Argon2VerifierHasher {
    params: Params,
    pepper: Option<SecretBox<[u8]>>,
}

impl Argon2VerifierHasher {
    /// # Errors
    /// Returns `TokenError::InvalidCost` for parameters Argon2 rejects.
    pub fn new(cost: HasherCost) -> Result<Self, TokenError> {
        Ok(Self {
            params: cost.params()?,
            pepper: None,
        })
    }

    /// Mix a server-side secret into every hash.
    ///
    /// # Errors
    /// Returns `TokenError::InvalidCost` if the cost or the pepper is rejected.
    pub fn with_pepper(cost: HasherCost, pepper: &[u8]) -> Result<Self, TokenError> {
        let hasher = Self {
            params: cost.params()?,
            pepper: Some(SecretBox::new(pepper.to_vec().into_boxed_slice())),
        };
        hasher
            .argon2()
            .map_err(|err| TokenError::InvalidCost(err.to_string()))?;
        Ok(hasher)
    }

    fn argon2(&self) -> Result<Argon2<'_>, argon2::Error> {
        match &self.pepper {
            Some(pepper) => Argon2::new_with_secret(
                pepper.expose_secret(),
                Algorithm::Argon2id,
                Version::V0x13,
                self.params.clone(),
            ),
            None => Ok(Argon2::new(
                Algorithm::Argon2id,
                Version::V0x13,
                self.params.clone(),
            )),
        }
    }
}

impl VerifierHasher for Argon2VerifierHasher {
    fn hash(&self, verifier: &Verifier) -> Result<VerifierHash, TokenError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = self.argon2().map_err(|_| TokenError::Hash)?;
        let hash = argon2
            .hash_password(verifier.expose(), &salt)
            .map_err(|_| TokenError::Hash)?
            .to_string();
        Ok(VerifierHash::new(hash))
    }

    fn verify(&self, hash: &VerifierHash, verifier: &Verifier) -> bool {
        let Ok(parsed) = PasswordHash::new(hash.as_str()) else {
            return false;
        };
        let Ok(argon2) = self.argon2() else {
            return false;
        };
        // The output comparison inside `verify_password` is constant time.
        argon2.verify_password(verifier.expose(), &parsed).is_ok()
    }
}
