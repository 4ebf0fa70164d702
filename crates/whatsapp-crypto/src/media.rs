//! Flow media attachment decryption.
//!
//! A distinct scheme from [`crate::flow`]. The provider's CDN serves a blob
//! that is `ciphertext‖mac_tag`: `ciphertext` is AES-256-CBC/PKCS#7 over the
//! plaintext, and `mac_tag` is the first 10 bytes of
//! `HMAC-SHA256(hmac_key, iv‖ciphertext)`. Separately, `encrypted_hash` is
//! the plain SHA-256 of the *whole downloaded blob* (ciphertext and tag
//! together) — not an HMAC, and not scoped to the ciphertext alone. Both
//! checks must pass before the ciphertext is decrypted, and the recovered
//! plaintext's SHA-256 must then match `plaintext_hash`. Any mismatch fails
//! closed.

use crate::error::CryptoError;
use aes::Aes256;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use cbc::cipher::{BlockDecryptMut, KeyIvInit, block_padding::Pkcs7};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

type Aes256CbcDec = cbc::Decryptor<Aes256>;
type HmacSha256 = Hmac<Sha256>;

/// The length, in bytes, of the truncated HMAC tag appended to the
/// ciphertext in the downloaded CDN blob.
const MAC_TAG_LEN: usize = 10;

/// The base64 key material the provider attaches to an encrypted Flow media reference.
#[derive(Debug, Clone)]
pub struct MediaEncryptionMetadata {
    /// Base64 AES-256 key.
    pub encryption_key: String,
    /// Base64 HMAC-SHA256 key.
    pub hmac_key: String,
    /// Base64 16-byte IV.
    pub iv: String,
    /// Base64 SHA-256 of the plaintext.
    pub plaintext_hash: String,
    /// Base64 SHA-256 of the full downloaded (encrypted) CDN blob.
    pub encrypted_hash: String,
}

/// Decrypt a Flow media attachment downloaded from the provider's CDN.
///
/// `cdn_file` is the raw bytes served by the CDN: the AES-256-CBC/PKCS#7
/// ciphertext followed by a 10-byte truncated HMAC tag.
///
/// # Errors
///
/// Returns [`CryptoError::MediaHashMismatch`] if `cdn_file`'s SHA-256 doesn't
/// match `encrypted_hash`, [`CryptoError::MediaHmacMismatch`] if the
/// embedded tag doesn't match, [`CryptoError::Cbc`] if CBC/PKCS#7 decryption
/// fails, or [`CryptoError::MediaHashMismatch`] again if the recovered
/// plaintext's SHA-256 doesn't match `plaintext_hash`.
pub fn decrypt(cdn_file: &[u8], metadata: &MediaEncryptionMetadata) -> Result<Vec<u8>, CryptoError> {
    let key = BASE64.decode(&metadata.encryption_key)?;
    let hmac_key = BASE64.decode(&metadata.hmac_key)?;
    let iv = BASE64.decode(&metadata.iv)?;
    let expected_encrypted_hash = BASE64.decode(&metadata.encrypted_hash)?;
    let expected_plaintext_hash = BASE64.decode(&metadata.plaintext_hash)?;

    let actual_encrypted_hash = Sha256::digest(cdn_file);
    if actual_encrypted_hash
        .as_slice()
        .ct_eq(&expected_encrypted_hash)
        .unwrap_u8()
        != 1
    {
        return Err(CryptoError::MediaHashMismatch);
    }

    if cdn_file.len() < MAC_TAG_LEN {
        return Err(CryptoError::MediaHmacMismatch);
    }
    let (ciphertext, tag) = cdn_file.split_at(cdn_file.len() - MAC_TAG_LEN);

    let mut mac = HmacSha256::new_from_slice(&hmac_key).map_err(|_| CryptoError::MediaHmacMismatch)?;
    mac.update(&iv);
    mac.update(ciphertext);
    let computed = mac.finalize().into_bytes();
    if computed[..MAC_TAG_LEN].ct_eq(tag).unwrap_u8() != 1 {
        return Err(CryptoError::MediaHmacMismatch);
    }

    let decryptor = Aes256CbcDec::new_from_slices(&key, &iv).map_err(|_| CryptoError::Cbc)?;
    let mut buf = ciphertext.to_vec();
    let plaintext = decryptor
        .decrypt_padded_mut::<Pkcs7>(&mut buf)
        .map_err(|_| CryptoError::Cbc)?
        .to_vec();

    let actual_plaintext_hash = Sha256::digest(&plaintext);
    if actual_plaintext_hash
        .as_slice()
        .ct_eq(&expected_plaintext_hash)
        .unwrap_u8()
        != 1
    {
        return Err(CryptoError::MediaHashMismatch);
    }

    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known_metadata() -> MediaEncryptionMetadata {
        MediaEncryptionMetadata {
            encryption_key: "202pQMDtZoAMwJwZJFVPqQOgdJRBahBmGywwSXz5tAY=".into(),
            hmac_key: "A/72TYylRAHTg/CdXpBtC6T6qcJ2C7Cf2qzZ/hqVASM=".into(),
            iv: "t1MOy02KXLbsH+NYkqkRXQ==".into(),
            plaintext_hash: "ZvSgxwXg5fWL7v7ggGHXtMCZYTf/nVFasOdX0p6kiP4=".into(),
            encrypted_hash: "pDhRHkyevzgkdg5ObY+MfzW5J6/ObZj/OrmAvyUeYA8=".into(),
        }
    }

    #[test]
    fn decrypts_known_vector() {
        let cdn_file: &[u8] = include_bytes!("../tests/fixtures/flow_media.bin");
        let plaintext = decrypt(cdn_file, &known_metadata()).unwrap();
        assert_eq!(&plaintext[..4], b"\xff\xd8\xff\xe0"); // JPEG magic
    }

    #[test]
    fn rejects_tampered_ciphertext() {
        let mut cdn_file: Vec<u8> = include_bytes!("../tests/fixtures/flow_media.bin").to_vec();
        cdn_file[0] ^= 0xFF;
        assert!(matches!(
            decrypt(&cdn_file, &known_metadata()),
            Err(CryptoError::MediaHashMismatch)
        ));
    }

    #[test]
    fn rejects_tampered_tag_with_matching_encrypted_hash() {
        // Flip a byte in the tag, then patch `encrypted_hash` to match the
        // tampered blob's digest, isolating the embedded-tag check.
        let mut cdn_file: Vec<u8> = include_bytes!("../tests/fixtures/flow_media.bin").to_vec();
        let last = cdn_file.len() - 1;
        cdn_file[last] ^= 0xFF;

        let mut metadata = known_metadata();
        metadata.encrypted_hash = BASE64.encode(Sha256::digest(&cdn_file));

        assert!(matches!(
            decrypt(&cdn_file, &metadata),
            Err(CryptoError::MediaHmacMismatch)
        ));
    }
}
