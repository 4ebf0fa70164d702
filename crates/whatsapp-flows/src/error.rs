//! Flow endpoint error taxonomy.

use thiserror::Error;

/// Errors the Flow endpoint processor can surface while handling one POST.
#[derive(Error, Debug)]
pub enum FlowError {
    /// Decryption of the request envelope failed; the caller must respond
    /// 421 so the provider refreshes its cached public key.
    #[error("flow request decryption failed")]
    Decryption(#[from] whatsapp_crypto::CryptoError),

    /// The decrypted body didn't match the expected `{version, action, data}` shape.
    #[error("malformed flow request body: {0}")]
    MalformedRequest(String),

    /// No private key was configured for an endpoint that received a request.
    #[error("no decryption key configured for this flow endpoint")]
    NoPrivateKey,

    /// The registered callback returned an error and `acknowledge_errors` is disabled.
    #[error("flow callback error: {0}")]
    Callback(String),

    /// Downloading an encrypted media attachment from the provider's CDN failed.
    #[error("flow media download failed: {0}")]
    MediaDownload(#[from] reqwest::Error),
}

impl FlowError {
    /// The HTTP status this error should produce.
    ///
    /// Every decryption failure maps to 421 per the provider's key-rotation
    /// contract; everything else is a plain 400, since acknowledgeable
    /// callback errors never reach this conversion (they're serialized as a
    /// 200 body instead).
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Decryption(_) | Self::NoPrivateKey => 421,
            Self::MalformedRequest(_) | Self::Callback(_) | Self::MediaDownload(_) => 400,
        }
    }
}
