//! Delivery of confirmation links.

use anyhow::Result;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::info;

use super::record::Purpose;

/// A confirmation link ready to be delivered.
#[derive(Debug)]
pub struct ConfirmationMail {
    pub to_email: String,
    pub purpose: Purpose,
    pub token: SecretString,
    pub confirm_url: SecretString,
    pub expires_at: DateTime<Utc>,
}

/// Mail delivery abstraction used by the workflow.
pub trait Mailer: Send + Sync {
    /// Deliver a message or return an error to abort the request.
    ///
    /// # Errors
    /// Returns an error if the message could not be handed to the transport.
    fn send(&self, mail: &ConfirmationMail) -> Result<()>;
}

/// Local dev mailer that logs the link instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, mail: &ConfirmationMail) -> Result<()> {
        let payload = json!({
            "email": mail.to_email,
            "confirm_url": mail.confirm_url.expose_secret(),
            "expires_at": mail.expires_at,
        });
        info!(
            to_email = %mail.to_email,
            template = %mail.purpose,
            payload = %payload,
            "confirmation mail send stub"
        );
        Ok(())
    }
}
