//! Split tokens.
//!
//! A split token pairs a public selector, used to find the pending request,
//! with a secret verifier that proves possession of the issued token. Only the
//! selector and an Argon2id hash of the verifier are ever stored.

pub mod codec;
mod error;
mod factory;
mod hasher;
mod value;
mod verifier;

pub use codec::TOKEN_LEN;
pub use error::TokenError;
pub use factory::{OsRandom, RandomSource, SplitTokenFactory};
#[doc(hidden)]
pub use factory::SeededRandom;
pub use hasher::{Argon2VerifierHasher, HasherCost, VerifierHash, VerifierHasher};
pub use value::SplitTokenValue;
pub use verifier::{SELECTOR_LEN, Selector, VERIFIER_LEN, Verifier};
