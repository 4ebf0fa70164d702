//! Client configuration.
//!
//! Configuration here is purely programmatic (no on-disk file format is
//! mandated): the client is constructed from a [`ClientConfig`] value, built
//! either directly or through [`ClientConfigBuilder`], mirroring the
//! builder-pattern the host codebase uses for its gateway configuration.

use crate::ids::{AppId, PhoneId, WabaId};
use crate::secrets::ApiKey;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required field was not supplied to the builder.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A supplied value failed validation.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Client configuration: endpoint selection, credentials, and behavioral toggles.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// The phone-number ID this client sends from.
    pub phone_id: PhoneId,
    /// Bearer token used for all Graph API calls.
    #[serde(skip_serializing)]
    pub token: ApiKey,
    /// The WhatsApp Business Account ID, required for template/flow management.
    pub business_account_id: Option<WabaId>,
    /// The Meta app ID, required for webhook subscription bootstrap.
    pub app_id: Option<AppId>,
    /// The app secret, required for webhook signature verification and subscription bootstrap.
    #[serde(skip_serializing)]
    pub app_secret: Option<ApiKey>,
    /// The verify token the provider must echo back during webhook subscription.
    pub verify_token: String,
    /// Local path the webhook HTTP server listens on.
    pub webhook_endpoint: String,
    /// Publicly reachable callback URL to register with the provider, if automatic registration is desired.
    pub callback_url: Option<String>,
    /// Webhook fields to subscribe to; defaults cover messages and template status events.
    #[serde(default = "default_webhook_fields")]
    pub webhook_fields: Vec<String>,
    /// PEM-encoded RSA private key used to decrypt Flow requests.
    #[serde(skip_serializing)]
    pub business_private_key: Option<ApiKey>,
    /// Password protecting `business_private_key`, if any.
    #[serde(skip_serializing)]
    pub business_private_key_password: Option<ApiKey>,
    /// Graph API version, e.g. `"v21.0"`.
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Drop `messages`-field updates whose `phone_number_id` doesn't match `phone_id`.
    #[serde(default = "default_true")]
    pub filter_updates: bool,
    /// Invoke every matching handler instead of stopping at the first match.
    #[serde(default)]
    pub continue_handling: bool,
    /// Collapse provider retries using the in-memory dedupe set.
    #[serde(default = "default_true")]
    pub skip_duplicate_updates: bool,
    /// Verify the `X-Hub-Signature-256` header on every inbound webhook POST.
    #[serde(default = "default_true")]
    pub validate_updates: bool,
    /// Delay, in seconds, before registering the callback URL on startup (lets the HTTP listener come up first).
    #[serde(default = "default_challenge_delay")]
    pub webhook_challenge_delay_secs: u64,
}

fn default_webhook_fields() -> Vec<String> {
    vec![
        "messages".to_string(),
        "message_template_status_update".to_string(),
    ]
}

fn default_api_version() -> String {
    "v21.0".to_string()
}

const fn default_true() -> bool {
    true
}

const fn default_challenge_delay() -> u64 {
    3
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("phone_id", &self.phone_id)
            .field("token", &self.token)
            .field("business_account_id", &self.business_account_id)
            .field("app_id", &self.app_id)
            .field("app_secret", &self.app_secret)
            .field("verify_token", &"[REDACTED]")
            .field("webhook_endpoint", &self.webhook_endpoint)
            .field("callback_url", &self.callback_url)
            .field("webhook_fields", &self.webhook_fields)
            .field("api_version", &self.api_version)
            .field("filter_updates", &self.filter_updates)
            .field("continue_handling", &self.continue_handling)
            .field("skip_duplicate_updates", &self.skip_duplicate_updates)
            .field("validate_updates", &self.validate_updates)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ClientConfig`], mirroring the host's gateway builder pattern.
#[derive(Default)]
pub struct ClientConfigBuilder {
    phone_id: Option<PhoneId>,
    token: Option<ApiKey>,
    business_account_id: Option<WabaId>,
    app_id: Option<AppId>,
    app_secret: Option<ApiKey>,
    verify_token: Option<String>,
    webhook_endpoint: Option<String>,
    callback_url: Option<String>,
    webhook_fields: Option<Vec<String>>,
    business_private_key: Option<ApiKey>,
    business_private_key_password: Option<ApiKey>,
    api_version: Option<String>,
    filter_updates: Option<bool>,
    continue_handling: Option<bool>,
    skip_duplicate_updates: Option<bool>,
    validate_updates: Option<bool>,
    webhook_challenge_delay_secs: Option<u64>,
}

impl ClientConfigBuilder {
    /// Start a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sending phone-number ID.
    #[must_use]
    pub fn phone_id(mut self, phone_id: impl Into<PhoneId>) -> Self {
        self.phone_id = Some(phone_id.into());
        self
    }

    /// Set the bearer token.
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(ApiKey::new(token.into()));
        self
    }

    /// Set the WhatsApp Business Account ID.
    #[must_use]
    pub fn business_account_id(mut self, id: impl Into<WabaId>) -> Self {
        self.business_account_id = Some(id.into());
        self
    }

    /// Set the Meta app ID.
    #[must_use]
    pub fn app_id(mut self, id: impl Into<AppId>) -> Self {
        self.app_id = Some(id.into());
        self
    }

    /// Set the app secret used for signature verification.
    #[must_use]
    pub fn app_secret(mut self, secret: impl Into<String>) -> Self {
        self.app_secret = Some(ApiKey::new(secret.into()));
        self
    }

    /// Set the webhook verify token.
    #[must_use]
    pub fn verify_token(mut self, token: impl Into<String>) -> Self {
        self.verify_token = Some(token.into());
        self
    }

    /// Set the local webhook HTTP path.
    #[must_use]
    pub fn webhook_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.webhook_endpoint = Some(endpoint.into());
        self
    }

    /// Set the public callback URL to auto-register on startup.
    #[must_use]
    pub fn callback_url(mut self, url: impl Into<String>) -> Self {
        self.callback_url = Some(url.into());
        self
    }

    /// Override the default webhook field subscription list.
    #[must_use]
    pub fn webhook_fields(mut self, fields: Vec<String>) -> Self {
        self.webhook_fields = Some(fields);
        self
    }

    /// Set the Flow-decryption private key (PEM).
    #[must_use]
    pub fn business_private_key(mut self, pem: impl Into<String>) -> Self {
        self.business_private_key = Some(ApiKey::new(pem.into()));
        self
    }

    /// Set the password protecting the Flow-decryption private key.
    #[must_use]
    pub fn business_private_key_password(mut self, password: impl Into<String>) -> Self {
        self.business_private_key_password = Some(ApiKey::new(password.into()));
        self
    }

    /// Override the Graph API version (default `"v21.0"`).
    #[must_use]
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Toggle phone-ID filtering of inbound `messages`-field updates.
    #[must_use]
    pub const fn filter_updates(mut self, enabled: bool) -> Self {
        self.filter_updates = Some(enabled);
        self
    }

    /// Toggle running every matching handler rather than stopping at the first.
    #[must_use]
    pub const fn continue_handling(mut self, enabled: bool) -> Self {
        self.continue_handling = Some(enabled);
        self
    }

    /// Toggle provider-retry deduplication.
    #[must_use]
    pub const fn skip_duplicate_updates(mut self, enabled: bool) -> Self {
        self.skip_duplicate_updates = Some(enabled);
        self
    }

    /// Toggle webhook signature validation.
    #[must_use]
    pub const fn validate_updates(mut self, enabled: bool) -> Self {
        self.validate_updates = Some(enabled);
        self
    }

    /// Override the callback-URL registration startup delay.
    #[must_use]
    pub const fn webhook_challenge_delay_secs(mut self, secs: u64) -> Self {
        self.webhook_challenge_delay_secs = Some(secs);
        self
    }

    /// Finalize the builder into a [`ClientConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] if `phone_id`, `token`, or
    /// `verify_token` were not supplied.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        Ok(ClientConfig {
            phone_id: self.phone_id.ok_or(ConfigError::MissingField("phone_id"))?,
            token: self.token.ok_or(ConfigError::MissingField("token"))?,
            business_account_id: self.business_account_id,
            app_id: self.app_id,
            app_secret: self.app_secret,
            verify_token: self
                .verify_token
                .ok_or(ConfigError::MissingField("verify_token"))?,
            webhook_endpoint: self.webhook_endpoint.unwrap_or_else(|| "/".to_string()),
            callback_url: self.callback_url,
            webhook_fields: self.webhook_fields.unwrap_or_else(default_webhook_fields),
            business_private_key: self.business_private_key,
            business_private_key_password: self.business_private_key_password,
            api_version: self.api_version.unwrap_or_else(default_api_version),
            filter_updates: self.filter_updates.unwrap_or(true),
            continue_handling: self.continue_handling.unwrap_or(false),
            skip_duplicate_updates: self.skip_duplicate_updates.unwrap_or(true),
            validate_updates: self.validate_updates.unwrap_or(true),
            webhook_challenge_delay_secs: self.webhook_challenge_delay_secs.unwrap_or(3),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_fills_in_defaults() {
        let config = ClientConfigBuilder::new()
            .phone_id("277321005464405")
            .token("EAAG...")
            .verify_token("my-verify-token")
            .build()
            .unwrap();

        assert_eq!(config.api_version, "v21.0");
        assert!(config.filter_updates);
        assert!(!config.continue_handling);
        assert_eq!(config.webhook_fields, default_webhook_fields());
    }

    #[test]
    fn builder_requires_phone_id() {
        let result = ClientConfigBuilder::new()
            .token("EAAG...")
            .verify_token("v")
            .build();
        assert!(matches!(result, Err(ConfigError::MissingField("phone_id"))));
    }

    #[test]
    fn debug_impl_redacts_secrets() {
        let config = ClientConfigBuilder::new()
            .phone_id("1")
            .token("super-secret-token")
            .verify_token("v")
            .build()
            .unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret-token"));
    }
}
