//! Cryptographic primitives for the WhatsApp Cloud API.
//!
//! Three independent schemes live here, each with its own module:
//!
//! - [`signature`] — `X-Hub-Signature-256` webhook verification (HMAC-SHA256).
//! - [`flow`] — Flow request/response envelope encryption (RSA-OAEP key
//!   unwrap + AES-128-GCM).
//! - [`media`] — Flow media attachment decryption (AES-256-CBC + embedded
//!   HMAC tag + detached SHA-256 checks).
//!
//! None of these share state; callers reach for whichever module matches
//! the payload in hand.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
pub mod flow;
pub mod media;
pub mod signature;

pub use error::CryptoError;
pub use flow::{DecryptedRequest, decrypt_request, encrypt_response, load_private_key, public_key_of};
pub use media::{MediaEncryptionMetadata, decrypt as decrypt_media};
pub use signature::{sign as sign_signature, verify as verify_signature};
