//! Flow request/response payload types.

use serde::{Deserialize, Serialize};
use whatsapp_crypto::MediaEncryptionMetadata;

use crate::error::FlowError;

/// A decrypted Flow request, handed to the registered callback.
#[derive(Debug, Clone, Deserialize)]
pub struct FlowRequest {
    /// Flow protocol version, echoed back in the response.
    pub version: String,
    /// `"INIT"`, `"ping"`, `"data_exchange"`, `"BACK"`, or an app-defined action name.
    pub action: String,
    /// Current screen name, absent on `INIT`.
    pub screen: Option<String>,
    /// Screen-specific payload.
    #[serde(default)]
    pub data: serde_json::Value,
    /// Opaque token the business attached when it sent the Flow, if any.
    pub flow_token: Option<String>,
    /// Provider-reported client error, present only on error-acknowledgment requests.
    pub error: Option<serde_json::Value>,
}

/// A callback's successful response: the next screen to render, or flow completion.
#[derive(Debug, Clone, Serialize)]
pub struct FlowResponse {
    /// Echoes the request's `version`.
    pub version: String,
    /// Next screen to render; absent when `close_flow` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen: Option<String>,
    /// Data to hydrate the next screen with.
    pub data: serde_json::Value,
    /// Set to terminate the Flow after this response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_flow: Option<bool>,
}

impl FlowResponse {
    /// Build a response that advances to `screen` with the given `data`.
    #[must_use]
    pub fn screen(version: impl Into<String>, screen: impl Into<String>, data: serde_json::Value) -> Self {
        Self { version: version.into(), screen: Some(screen.into()), data, close_flow: None }
    }

    /// Build a response that terminates the Flow.
    #[must_use]
    pub fn terminate(version: impl Into<String>, data: serde_json::Value) -> Self {
        Self { version: version.into(), screen: None, data, close_flow: Some(true) }
    }
}

/// A reference to an encrypted media attachment embedded in a Flow request,
/// decrypted lazily on demand rather than eagerly on every request.
#[derive(Debug, Clone)]
pub struct EncryptedMediaReference {
    /// Signed CDN URL the provider attached to the attachment.
    pub cdn_url: String,
    /// Key material needed to decrypt the downloaded blob.
    pub metadata: MediaEncryptionMetadata,
}

impl EncryptedMediaReference {
    /// Parse a reference out of the `media` object a Flow data payload embeds.
    #[must_use]
    pub fn new(cdn_url: impl Into<String>, metadata: MediaEncryptionMetadata) -> Self {
        Self { cdn_url: cdn_url.into(), metadata }
    }

    /// Download the attachment from the CDN and decrypt it.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::MediaDownload`] on a transport failure or
    /// [`FlowError::Decryption`] if any integrity check fails.
    pub async fn decrypt(&self, http: &reqwest::Client) -> Result<Vec<u8>, FlowError> {
        let cdn_file = http.get(&self.cdn_url).send().await?.bytes().await?;
        let plaintext = whatsapp_crypto::decrypt_media(&cdn_file, &self.metadata)?;
        Ok(plaintext)
    }
}
