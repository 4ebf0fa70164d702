//! Flow request decryption and response encryption.
//!
//! The request envelope wraps a 128-bit AES key under RSA-OAEP(SHA-256); the
//! wrapped plaintext carries ciphertext‖tag for AES-128-GCM. The response
//! reuses the same AES key but with every byte of the IV complemented
//! (XORed with `0xFF`) — the one genuinely non-obvious detail of the scheme.

use crate::error::CryptoError;
use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes128Gcm, KeyInit, Nonce};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use rsa::Oaep;
use rsa::pkcs8::DecodePrivateKey;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde_json::Value;
use sha2::Sha256;

const GCM_TAG_LEN: usize = 16;

/// Load an RSA private key from a PEM-encoded PKCS#8 blob, optionally
/// password-protected (`ENCRYPTED PRIVATE KEY`).
///
/// # Errors
///
/// Returns [`CryptoError::Pkcs8`] if the PEM cannot be parsed or decrypted.
pub fn load_private_key(pem: &str, password: Option<&str>) -> Result<RsaPrivateKey, CryptoError> {
    match password {
        Some(password) => RsaPrivateKey::from_pkcs8_encrypted_pem(pem, password)
            .map_err(|e| CryptoError::Pkcs8(e.to_string())),
        None => RsaPrivateKey::from_pkcs8_pem(pem).map_err(|e| CryptoError::Pkcs8(e.to_string())),
    }
}

/// Unwrap the AES key carried in a Flow envelope with an RSA public key,
/// used only by test fixtures that need to construct envelopes; production
/// code always decrypts with the business's private key via [`decrypt_request`].
#[must_use]
pub fn public_key_of(private_key: &RsaPrivateKey) -> RsaPublicKey {
    RsaPublicKey::from(private_key)
}

/// The result of decrypting a Flow request envelope: the parsed JSON body
/// plus the raw AES key and request IV, needed to encrypt the response.
pub struct DecryptedRequest {
    /// Parsed `{version, action, screen?, data, flow_token?}` body.
    pub data: Value,
    /// The unwrapped 128-bit AES key.
    pub aes_key: [u8; 16],
    /// The request's 96-bit IV.
    pub iv: [u8; 12],
}

/// Decrypt a Flow request envelope.
///
/// `encrypted_flow_data_b64`, `encrypted_aes_key_b64`, and `iv_b64` are the
/// three base64 fields from the raw POST body.
///
/// # Errors
///
/// Returns [`CryptoError::Base64`], [`CryptoError::Rsa`], or
/// [`CryptoError::Aead`] on any decoding/decryption failure, and
/// [`CryptoError::Json`] if the decrypted bytes are not valid JSON.
pub fn decrypt_request(
    private_key: &RsaPrivateKey,
    encrypted_flow_data_b64: &str,
    encrypted_aes_key_b64: &str,
    iv_b64: &str,
) -> Result<DecryptedRequest, CryptoError> {
    let wrapped_key = BASE64.decode(encrypted_aes_key_b64)?;
    let flow_data = BASE64.decode(encrypted_flow_data_b64)?;
    let iv_bytes = BASE64.decode(iv_b64)?;

    let padding = Oaep::new::<Sha256>();
    let aes_key_vec = private_key.decrypt(padding, &wrapped_key)?;
    let aes_key: [u8; 16] = aes_key_vec
        .try_into()
        .map_err(|_| CryptoError::Rsa(rsa::Error::Decryption))?;

    let iv: [u8; 12] = iv_bytes.try_into().map_err(|_| CryptoError::Aead)?;

    if flow_data.len() < GCM_TAG_LEN {
        return Err(CryptoError::Aead);
    }
    let (ciphertext, tag) = flow_data.split_at(flow_data.len() - GCM_TAG_LEN);

    let cipher = Aes128Gcm::new_from_slice(&aes_key).map_err(|_| CryptoError::Aead)?;
    let nonce = Nonce::from_slice(&iv);
    let mut combined = Vec::with_capacity(ciphertext.len() + tag.len());
    combined.extend_from_slice(ciphertext);
    combined.extend_from_slice(tag);
    let plaintext = cipher
        .decrypt(nonce, Payload { msg: &combined, aad: &[] })
        .map_err(|_| CryptoError::Aead)?;

    let data: Value = serde_json::from_slice(&plaintext)?;

    Ok(DecryptedRequest { data, aes_key, iv })
}

/// Encrypt a Flow response with the request's AES key and bit-flipped IV.
///
/// # Errors
///
/// Returns [`CryptoError::Aead`] if encryption fails, or
/// [`CryptoError::Json`] if `response` cannot be serialized.
pub fn encrypt_response(
    response: &Value,
    aes_key: &[u8; 16],
    request_iv: &[u8; 12],
) -> Result<String, CryptoError> {
    let flipped_iv: Vec<u8> = request_iv.iter().map(|b| b ^ 0xFF).collect();

    let cipher = Aes128Gcm::new_from_slice(aes_key).map_err(|_| CryptoError::Aead)?;
    let nonce = Nonce::from_slice(&flipped_iv);

    let plaintext = serde_json::to_vec(response)?;
    let ciphertext_and_tag = cipher
        .encrypt(nonce, Payload { msg: &plaintext, aad: &[] })
        .map_err(|_| CryptoError::Aead)?;

    Ok(BASE64.encode(ciphertext_and_tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PRIVATE_KEY_PEM: &str = include_str!("../tests/fixtures/flow_private_key.pem");

    #[test]
    fn decrypts_and_reencrypts_known_vector() {
        use pretty_assertions::assert_eq;

        let private_key = load_private_key(PRIVATE_KEY_PEM, Some("pywa")).unwrap();

        let decrypted = decrypt_request(
            &private_key,
            "sCTmBCqjs0GkkX6n/nyZDuyjpaijuelY3I/8rlr1ZIEymEzCMnDGQdxQ9OGaKw0CEaWSgc/GLhuixa8NTQNYXAyVfTaU9H2FWEabWUb8nbZYRdYy81XHUkDCodl4SvBhhufEag==",
            "gSTeWDqfKqo1eL73VstmrMm5k5lymwUwXCfuxauPFPoW7Ji9dgcG74Y6YRtoYOAch6Z/AgrR7EAlsRi/s8xT/Gx2WWz6zfcXPUQVpoIlp7EgC+HmmA2ZK64g/107yL+vKoUdL0mWJHQf1ml12HszBxOtNlW+7GAMPESNDqGpgy1R3Zgz/luStp2INtigps9w2j9+Ktp0smqxHqpUkBWp8xxoWVvzPK4H0jcFm7sjFMpiJ1e1EjApo7iDqldys0tMRC+KoOjJVD6aq1gY5s2yYL7iCXXgEAKJItTk/4/mbWWNkRtd9NoEGnMHilcjYOzlUCHehAO9fos+WCLE87JAXw==",
            "5eCmDjs+VAJwdo5caZtgbw==",
        )
        .unwrap();

        assert_eq!(
            decrypted.data,
            json!({
                "data": {},
                "flow_token": "my_flow_token",
                "screen": "",
                "action": "INIT",
                "version": "3.0",
            })
        );

        let response = json!({"version": "3.0", "screen": "SUCCESS", "data": {"key": "value"}});
        let encrypted = encrypt_response(&response, &decrypted.aes_key, &decrypted.iv).unwrap();

        assert_eq!(
            encrypted,
            "FBEoV73B8mnSt+nzfurVK704zkwHsr1uu/m953h5vNdri5G4Pe/BoDTh6SgzgjrrZ4iP12GO3kti8YW7Tn1KibKaRf8LE/gps2ATJq3nWSCI"
        );
    }

    #[test]
    fn rejects_non_flipped_iv_on_decrypt() {
        let private_key = load_private_key(PRIVATE_KEY_PEM, Some("pywa")).unwrap();
        let decrypted = decrypt_request(
            &private_key,
            "sCTmBCqjs0GkkX6n/nyZDuyjpaijuelY3I/8rlr1ZIEymEzCMnDGQdxQ9OGaKw0CEaWSgc/GLhuixa8NTQNYXAyVfTaU9H2FWEabWUb8nbZYRdYy81XHUkDCodl4SvBhhufEag==",
            "gSTeWDqfKqo1eL73VstmrMm5k5lymwUwXCfuxauPFPoW7Ji9dgcG74Y6YRtoYOAch6Z/AgrR7EAlsRi/s8xT/Gx2WWz6zfcXPUQVpoIlp7EgC+HmmA2ZK64g/107yL+vKoUdL0mWJHQf1ml12HszBxOtNlW+7GAMPESNDqGpgy1R3Zgz/luStp2INtigps9w2j9+Ktp0smqxHqpUkBWp8xxoWVvzPK4H0jcFm7sjFMpiJ1e1EjApo7iDqldys0tMRC+KoOjJVD6aq1gY5s2yYL7iCXXgEAKJItTk/4/mbWWNkRtd9NoEGnMHilcjYOzlUCHehAO9fos+WCLE87JAXw==",
            "5eCmDjs+VAJwdo5caZtgbw==",
        )
        .unwrap();

        // Encrypting with the *unflipped* IV must not reproduce the provider's ciphertext.
        let cipher = Aes128Gcm::new_from_slice(&decrypted.aes_key).unwrap();
        let nonce = Nonce::from_slice(&decrypted.iv);
        let plaintext = serde_json::to_vec(&json!({"version": "3.0"})).unwrap();
        let wrong = cipher.encrypt(nonce, plaintext.as_slice()).unwrap();
        let right_flipped_nonce: Vec<u8> = decrypted.iv.iter().map(|b| b ^ 0xFF).collect();
        let right = cipher
            .encrypt(Nonce::from_slice(&right_flipped_nonce), plaintext.as_slice())
            .unwrap();
        assert_ne!(wrong, right);
    }
}
