//! `X-Hub-Signature-256` verification.

use crate::error::CryptoError;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verify a webhook request body against its `X-Hub-Signature-256` header.
///
/// `header` is the full header value, e.g. `"sha256=54edfa1d…"`. The HMAC is
/// computed over the exact bytes of `body` — any re-serialization before
/// calling this function will invalidate a genuine signature.
///
/// # Errors
///
/// Returns [`CryptoError::MalformedSignature`] if the header does not start
/// with `sha256=` or is not valid hex, and
/// [`CryptoError::SignatureMismatch`] if the computed HMAC does not match.
pub fn verify(app_secret: &str, body: &[u8], header: &str) -> Result<(), CryptoError> {
    let hex_digest = header
        .strip_prefix("sha256=")
        .ok_or(CryptoError::MalformedSignature)?;
    let expected = hex::decode(hex_digest).map_err(|_| CryptoError::MalformedSignature)?;

    let mut mac =
        HmacSha256::new_from_slice(app_secret.as_bytes()).map_err(|_| CryptoError::MalformedSignature)?;
    mac.update(body);

    mac.verify_slice(&expected)
        .map_err(|_| CryptoError::SignatureMismatch)
}

/// Compute the `sha256=<hex>` header value for a body, for use by callers
/// constructing test fixtures or re-signing forwarded payloads.
#[must_use]
pub fn sign(app_secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(app_secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const APP_SECRET: &str = "1222e786b144d0e85b9f365372d93676";
    const BODY: &[u8] = br#"{"object":"whatsapp_business_account","entry":[{"id":"264937493375603","changes":[{"value":{"messaging_product":"whatsapp","metadata":{"display_phone_number":"15550953877","phone_number_id":"277321005464405"},"contacts":[{"profile":{"name":"PyWa Tests"},"wa_id":"972544401243"}],"messages":[{"from":"972544401243","id":"wamid.HBgMOTcyNTQ0NDAxMjQzFQIAEhggM0RFQTNCMEEwRTY3QzUwODYzMDc4NjQ4QzM4ODAxM0YA","timestamp":"1730231903","text":{"body":"Hey there! I am using PyWa."},"type":"text"}]},"field":"messages"}]}]}"#;
    const SIGNATURE: &str = "sha256=54edfa1d7259e0eb13c677cc7d73d1b5c86cfa12433d19156e058ab9251bc441";

    #[test]
    fn verifies_known_good_signature() {
        verify(APP_SECRET, BODY, SIGNATURE).unwrap();
    }

    #[test]
    fn rejects_mutated_body() {
        let mut mutated = BODY.to_vec();
        mutated[0] = b'[';
        assert!(verify(APP_SECRET, &mutated, SIGNATURE).is_err());
    }

    #[test]
    fn rejects_missing_prefix() {
        let err = verify(APP_SECRET, BODY, "54edfa1d").unwrap_err();
        assert!(matches!(err, CryptoError::MalformedSignature));
    }

    #[test]
    fn sign_round_trips_with_verify() {
        let header = sign(APP_SECRET, BODY);
        verify(APP_SECRET, BODY, &header).unwrap();
    }
}
