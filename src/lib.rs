//! # Countersign (split-token confirmation)
//!
//! `countersign` issues and verifies the links behind password resets and
//! email-address changes.
//!
//! ## Split tokens
//!
//! A token is a public **selector** followed by a secret **verifier**. The
//! selector finds the pending request; the verifier proves the caller holds the
//! token that was mailed out. Only the selector and an Argon2id hash of the
//! verifier are stored, so a database leak does not yield usable links.
//!
//! ## Confirmation
//!
//! - **One request per subject and purpose:** issuing a new token replaces the
//!   previous one.
//! - **Single attempt:** any failed confirmation after the record was found
//!   (expired, wrong verifier, wrong purpose) deletes the record; the user has to
//!   request a new link.
//! - **No oracle:** every rejection surfaces as `TokenNotAccepted`; the exact
//!   reason is only logged.
//! - **Side effects as values:** each call returns `ConfirmationEvent`s for the
//!   caller to publish.

pub mod cli;
pub mod confirm;
pub mod storage;
pub mod token;
