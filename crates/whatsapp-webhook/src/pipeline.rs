//! Ties the decoder, handler registry, listener coordinator, and dedupe set
//! together behind the webhook's two logical entry points (challenge + update).

use std::sync::Arc;

use whatsapp_core::ids::PhoneId;

use crate::dedupe::{DedupeSet, body_hash};
use crate::decoder::decode_envelope;
use crate::envelope::WebhookEnvelope;
use crate::error::WebhookError;
use crate::listener::{ListenerCoordinator, ListenerIdentifier, Resolution};
use crate::registry::HandlerRegistry;

/// Static configuration the pipeline needs on every request.
pub struct WebhookConfig {
    /// Token the provider's challenge GET must present to be accepted.
    pub verify_token: String,
    /// App secret used to verify `X-Hub-Signature-256`; `None` disables verification.
    pub app_secret: Option<String>,
    /// Restrict decoded `messages`-field updates to this phone number.
    pub filter_phone_id: Option<PhoneId>,
}

/// The whole inbound webhook pipeline for one client context type `C`.
pub struct WebhookPipeline<C> {
    config: WebhookConfig,
    registry: HandlerRegistry<C>,
    listeners: Arc<ListenerCoordinator>,
    dedupe: DedupeSet,
}

impl<C: Clone + Send + Sync + 'static> WebhookPipeline<C> {
    /// Construct a pipeline around a config, a handler registry, and a shared listener coordinator.
    #[must_use]
    pub fn new(config: WebhookConfig, registry: HandlerRegistry<C>, listeners: Arc<ListenerCoordinator>) -> Self {
        Self { config, registry, listeners, dedupe: DedupeSet::default() }
    }

    /// Handle the provider's subscription-verification GET.
    ///
    /// Returns the challenge string to echo back with a 200, or `None` if the
    /// caller should respond 403.
    #[must_use]
    pub fn handle_challenge(&self, mode: &str, verify_token: &str, challenge: &str) -> Option<String> {
        (mode == "subscribe" && verify_token == self.config.verify_token).then(|| challenge.to_string())
    }

    /// Handle one inbound update POST.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::SignatureInvalid`] or
    /// [`WebhookError::MalformedUpdate`] per the step each failure occurs at;
    /// the caller maps these to their HTTP status via [`WebhookError::status_code`].
    pub async fn handle_update(&self, ctx: C, body: &[u8], signature_header: Option<&str>) -> Result<(), WebhookError> {
        match &self.config.app_secret {
            Some(app_secret) => {
                let header = signature_header
                    .ok_or(WebhookError::SignatureInvalid(whatsapp_crypto::CryptoError::MalformedSignature))?;
                whatsapp_crypto::verify_signature(app_secret, body, header)?;
            }
            None => tracing::warn!("no app_secret configured, skipping webhook signature verification"),
        }

        let envelope: WebhookEnvelope =
            serde_json::from_slice(body).map_err(|e| WebhookError::MalformedUpdate(e.to_string()))?;

        let dedupe_key = signature_header.map(ToString::to_string).unwrap_or_else(|| body_hash(body));
        if self.dedupe.test_and_insert(&dedupe_key).await {
            return Ok(());
        }

        let decoded = decode_envelope(&envelope, self.config.filter_phone_id.as_ref());
        for change in &decoded {
            match &change.update {
                None => {
                    self.registry.dispatch_raw(ctx.clone(), &change.field, &change.raw).await;
                }
                Some(update) => {
                    let mut consumed = false;
                    if let Some(identifier) = ListenerIdentifier::of(update) {
                        match self.listeners.resolve(&identifier, update).await {
                            Resolution::Delivered | Resolution::Canceled => consumed = true,
                            Resolution::NotMatched | Resolution::NoListener => {}
                        }
                    }
                    if !consumed {
                        self.registry.dispatch_typed(ctx.clone(), update).await;
                    }
                    self.registry.dispatch_raw(ctx.clone(), &change.field, &change.raw).await;
                }
            }
        }

        self.dedupe.remove(&dedupe_key).await;
        Ok(())
    }

    /// The pipeline's shared listener coordinator, for building `wait_for_*` helpers.
    #[must_use]
    pub fn listeners(&self) -> &Arc<ListenerCoordinator> {
        &self.listeners
    }

    /// The pipeline's handler registry.
    #[must_use]
    pub fn registry(&self) -> &HandlerRegistry<C> {
        &self.registry
    }

    /// The pipeline's handler registry, mutably, for registering handlers after construction.
    pub fn registry_mut(&mut self) -> &mut HandlerRegistry<C> {
        &mut self.registry
    }
}

/// Bootstrap the webhook subscription on startup: obtain an app access token
/// and register the callback URL with the provider, after an optional delay
/// so the HTTP listener is already bound when the provider's synchronous
/// verification GET arrives.
///
/// # Errors
///
/// Propagates [`whatsapp_graph::GraphError`] from either Graph call.
pub async fn bootstrap_subscription(
    client: &whatsapp_graph::GraphClient,
    app_id: &whatsapp_core::ids::AppId,
    app_secret: &str,
    callback_url: &str,
    verify_token: &str,
    fields: &[String],
    startup_delay: std::time::Duration,
) -> Result<(), whatsapp_graph::GraphError> {
    if !startup_delay.is_zero() {
        tokio::time::sleep(startup_delay).await;
    }
    let token = whatsapp_graph::subscriptions::app_access_token(client, app_id, app_secret).await?;
    let authed =
        whatsapp_graph::GraphClient::with_host(whatsapp_core::ApiKey::new(token), client.api_version().to_string(), client.host().to_string());
    whatsapp_graph::subscriptions::subscribe(&authed, app_id, callback_url, verify_token, fields).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn challenge_accepts_matching_token() {
        let pipeline: WebhookPipeline<()> = WebhookPipeline::new(
            WebhookConfig { verify_token: "secret".to_string(), app_secret: None, filter_phone_id: None },
            HandlerRegistry::new(),
            Arc::new(ListenerCoordinator::new()),
        );
        assert_eq!(pipeline.handle_challenge("subscribe", "secret", "123"), Some("123".to_string()));
        assert_eq!(pipeline.handle_challenge("subscribe", "wrong", "123"), None);
    }
}
