//! Webhook pipeline error taxonomy.
//!
//! Every variant here maps to a specific HTTP status in [`crate::server`];
//! none of them are retried by the provider on purpose, since WhatsApp
//! interprets any non-2xx as "please resend" and 5xx as "resend sooner".

use thiserror::Error;

/// Errors the webhook pipeline can surface while handling one POST.
#[derive(Error, Debug)]
pub enum WebhookError {
    /// `X-Hub-Signature-256` did not match the configured app secret.
    #[error("signature verification failed")]
    SignatureInvalid(#[from] whatsapp_crypto::CryptoError),

    /// The body was not valid JSON, or was JSON but missing required fields.
    #[error("malformed update body: {0}")]
    MalformedUpdate(String),
}

impl WebhookError {
    /// The HTTP status this error should produce, per the error-handling design.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::SignatureInvalid(_) => 401,
            Self::MalformedUpdate(_) => 400,
        }
    }
}
