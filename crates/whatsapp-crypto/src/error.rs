//! Crypto error types.

use thiserror::Error;

/// Errors raised by any operation in this crate.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// The `X-Hub-Signature-256` header was malformed (missing the `sha256=` prefix, bad hex).
    #[error("malformed signature header")]
    MalformedSignature,

    /// The computed HMAC did not match the supplied signature.
    #[error("signature verification failed")]
    SignatureMismatch,

    /// Base64 decoding failed.
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// RSA key loading or unwrap failed.
    #[error("RSA error: {0}")]
    Rsa(#[from] rsa::Error),

    /// PKCS#8 private key parsing failed.
    #[error("private key parse error: {0}")]
    Pkcs8(String),

    /// AES-GCM encryption or decryption failed (bad tag, bad key length).
    #[error("AES-GCM error")]
    Aead,

    /// AES-CBC decryption failed (bad padding, bad key/IV length).
    #[error("AES-CBC error")]
    Cbc,

    /// The media HMAC integrity check failed.
    #[error("media HMAC integrity check failed")]
    MediaHmacMismatch,

    /// The decrypted media's SHA-256 did not match the declared `plaintext_hash`.
    #[error("media plaintext hash mismatch")]
    MediaHashMismatch,

    /// The decrypted flow payload was not valid JSON.
    #[error("flow payload JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
