//! Builder tying together a [`ClientConfigBuilder`], a handler registry, and
//! any number of registered Flow endpoints into one [`WhatsApp`] facade.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use whatsapp_core::config::ClientConfigBuilder;
use whatsapp_core::ids::{AppId, PhoneId, WabaId};
use whatsapp_core::update::Update;
use whatsapp_flows::{FlowCallback, FlowEndpointConfig, FlowProcessor};
use whatsapp_graph::GraphClient;
use whatsapp_webhook::{
    Handler, HandlerRegistry, HandlerSignal, ListenerCoordinator, RawCallback, UpdateKind, WebhookConfig,
    WebhookPipeline,
};

use crate::client::{Inner, WhatsApp};
use crate::error::ClientError;

macro_rules! on_update_kind {
    ($(#[$meta:meta])* $fn_name:ident, $variant:ident, $payload:ty) => {
        $(#[$meta])*
        #[must_use]
        pub fn $fn_name<F, Fut>(mut self, callback: F) -> Self
        where
            F: Fn(WhatsApp, $payload) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = Option<HandlerSignal>> + Send + 'static,
        {
            let callback = Arc::new(callback);
            self.registry.register(
                UpdateKind::$variant,
                Handler::new(Arc::new(move |ctx: WhatsApp, update: Update| {
                    let callback = Arc::clone(&callback);
                    Box::pin(async move {
                        match update {
                            Update::$variant(payload) => callback(ctx, payload).await,
                            _ => None,
                        }
                    })
                })),
            );
            self
        }
    };
}

/// Builds a [`WhatsApp`] client: configuration, update handlers, and Flow endpoints.
pub struct WhatsAppBuilder {
    config: ClientConfigBuilder,
    registry: HandlerRegistry<WhatsApp>,
    flows: HashMap<String, (FlowEndpointConfig, FlowCallback)>,
}

impl Default for WhatsAppBuilder {
    fn default() -> Self {
        Self { config: ClientConfigBuilder::new(), registry: HandlerRegistry::new(), flows: HashMap::new() }
    }
}

impl WhatsAppBuilder {
    /// Start a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sending phone-number ID.
    #[must_use]
    pub fn phone_id(mut self, phone_id: impl Into<PhoneId>) -> Self {
        self.config = self.config.phone_id(phone_id);
        self
    }

    /// Set the bearer token.
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config = self.config.token(token);
        self
    }

    /// Set the WhatsApp Business Account ID, required for template/flow management.
    #[must_use]
    pub fn business_account_id(mut self, id: impl Into<WabaId>) -> Self {
        self.config = self.config.business_account_id(id);
        self
    }

    /// Set the Meta app ID, required for webhook subscription bootstrap.
    #[must_use]
    pub fn app_id(mut self, id: impl Into<AppId>) -> Self {
        self.config = self.config.app_id(id);
        self
    }

    /// Set the app secret, required for signature verification and subscription bootstrap.
    #[must_use]
    pub fn app_secret(mut self, secret: impl Into<String>) -> Self {
        self.config = self.config.app_secret(secret);
        self
    }

    /// Set the webhook verify token.
    #[must_use]
    pub fn verify_token(mut self, token: impl Into<String>) -> Self {
        self.config = self.config.verify_token(token);
        self
    }

    /// Set the local webhook HTTP path.
    #[must_use]
    pub fn webhook_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config = self.config.webhook_endpoint(endpoint);
        self
    }

    /// Set the public callback URL to auto-register on startup.
    #[must_use]
    pub fn callback_url(mut self, url: impl Into<String>) -> Self {
        self.config = self.config.callback_url(url);
        self
    }

    /// Override the default webhook field subscription list.
    #[must_use]
    pub fn webhook_fields(mut self, fields: Vec<String>) -> Self {
        self.config = self.config.webhook_fields(fields);
        self
    }

    /// Set the Flow-decryption private key (PEM), for deployments that keep
    /// a single business-wide key rather than one per registered endpoint.
    #[must_use]
    pub fn business_private_key(mut self, pem: impl Into<String>) -> Self {
        self.config = self.config.business_private_key(pem);
        self
    }

    /// Set the password protecting `business_private_key`.
    #[must_use]
    pub fn business_private_key_password(mut self, password: impl Into<String>) -> Self {
        self.config = self.config.business_private_key_password(password);
        self
    }

    /// Override the Graph API version (default `"v21.0"`).
    #[must_use]
    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.config = self.config.api_version(version);
        self
    }

    /// Toggle phone-ID filtering of inbound `messages`-field updates.
    #[must_use]
    pub fn filter_updates(mut self, enabled: bool) -> Self {
        self.config = self.config.filter_updates(enabled);
        self
    }

    /// Toggle running every matching handler rather than stopping at the first.
    #[must_use]
    pub fn continue_handling(mut self, enabled: bool) -> Self {
        self.config = self.config.continue_handling(enabled);
        self
    }

    /// Toggle provider-retry deduplication.
    #[must_use]
    pub fn skip_duplicate_updates(mut self, enabled: bool) -> Self {
        self.config = self.config.skip_duplicate_updates(enabled);
        self
    }

    /// Toggle webhook signature validation.
    #[must_use]
    pub fn validate_updates(mut self, enabled: bool) -> Self {
        self.config = self.config.validate_updates(enabled);
        self
    }

    /// Override the callback-URL registration startup delay.
    #[must_use]
    pub fn webhook_challenge_delay_secs(mut self, secs: u64) -> Self {
        self.config = self.config.webhook_challenge_delay_secs(secs);
        self
    }

    /// Register a Flow endpoint: requests POSTed to `path` are decrypted,
    /// routed, and encrypted by `callback`.
    #[must_use]
    pub fn register_flow_endpoint(mut self, path: impl Into<String>, config: FlowEndpointConfig, callback: FlowCallback) -> Self {
        self.flows.insert(path.into(), (config, callback));
        self
    }

    /// Register a raw-update handler, invoked for every decoded change
    /// regardless of whether it resolved into a typed [`Update`].
    #[must_use]
    pub fn on_raw_update<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(WhatsApp, String, serde_json::Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let callback = Arc::new(callback);
        let wrapped: RawCallback<WhatsApp> = Arc::new(move |ctx, field, raw| {
            let callback = Arc::clone(&callback);
            Box::pin(async move { callback(ctx, field, raw).await })
        });
        self.registry.register_raw(wrapped);
        self
    }

    on_update_kind!(
        /// Register a handler for plain inbound messages.
        on_message,
        Message,
        whatsapp_core::message::Message
    );
    on_update_kind!(
        /// Register a handler for reply-button taps.
        on_callback_button,
        CallbackButton,
        whatsapp_core::interactive::CallbackButton
    );
    on_update_kind!(
        /// Register a handler for list-row selections.
        on_callback_selection,
        CallbackSelection,
        whatsapp_core::interactive::CallbackSelection
    );
    on_update_kind!(
        /// Register a handler for completed Flow exchanges.
        on_flow_completion,
        FlowCompletion,
        whatsapp_core::interactive::FlowCompletion
    );
    on_update_kind!(
        /// Register a handler for delivery-status changes.
        on_message_status,
        MessageStatus,
        whatsapp_core::update::MessageStatus
    );
    on_update_kind!(
        /// Register a handler for template approval-status changes.
        on_template_status_update,
        TemplateStatusUpdate,
        whatsapp_core::update::TemplateStatusUpdate
    );
    on_update_kind!(
        /// Register a handler for template quality-score changes.
        on_template_quality_update,
        TemplateQualityUpdate,
        whatsapp_core::update::TemplateQualityUpdate
    );
    on_update_kind!(
        /// Register a handler for template category changes.
        on_template_category_update,
        TemplateCategoryUpdate,
        whatsapp_core::update::TemplateCategoryUpdate
    );
    on_update_kind!(
        /// Register a handler for "request welcome message" events.
        on_chat_opened,
        ChatOpened,
        whatsapp_core::update::ChatOpened
    );
    on_update_kind!(
        /// Register a handler for customer phone-number changes.
        on_phone_number_change,
        PhoneNumberChange,
        whatsapp_core::update::PhoneNumberChange
    );
    on_update_kind!(
        /// Register a handler for customer identity changes.
        on_identity_change,
        IdentityChange,
        whatsapp_core::update::IdentityChange
    );
    on_update_kind!(
        /// Register a handler for inbound/outbound call events.
        on_call_event,
        CallEvent,
        whatsapp_core::update::CallEvent
    );
    on_update_kind!(
        /// Register a handler for call status changes.
        on_call_status,
        CallStatus,
        whatsapp_core::update::CallStatus
    );
    on_update_kind!(
        /// Register a handler for user messaging-preference changes.
        on_user_preferences_update,
        UserPreferencesUpdate,
        whatsapp_core::update::UserPreferencesUpdate
    );

    /// Finalize the builder into a running [`WhatsApp`] client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if required configuration
    /// (`phone_id`/`token`/`verify_token`) is missing, or
    /// [`ClientError::Flow`] if a registered Flow endpoint's private key
    /// cannot be parsed.
    pub fn build(self) -> Result<WhatsApp, ClientError> {
        let config = self.config.build()?;

        let mut registry = self.registry;
        registry.continue_handling = config.continue_handling;

        let graph = GraphClient::new(config.token.clone(), config.api_version.clone());

        let webhook_config = WebhookConfig {
            verify_token: config.verify_token.clone(),
            app_secret: config.validate_updates.then(|| config.app_secret.as_ref().map(|s| s.expose().to_string())).flatten(),
            filter_phone_id: config.filter_updates.then(|| config.phone_id.clone()),
        };
        let pipeline = Arc::new(WebhookPipeline::new(webhook_config, registry, Arc::new(ListenerCoordinator::new())));

        let flows = self
            .flows
            .into_iter()
            .map(|(path, (endpoint_config, callback))| {
                FlowProcessor::new(endpoint_config, callback).map(|processor| (path, Arc::new(processor)))
            })
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(WhatsApp { inner: Arc::new(Inner { graph, config, pipeline, flows }) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_phone_id_and_token() {
        let result = WhatsAppBuilder::new().verify_token("v").build();
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[test]
    fn build_succeeds_with_minimal_configuration() {
        let client = WhatsAppBuilder::new()
            .phone_id("277321005464405")
            .token("test-token")
            .verify_token("secret")
            .build()
            .unwrap();
        assert_eq!(client.phone_id().as_str(), "277321005464405");
    }

    #[tokio::test]
    async fn registered_message_handler_runs_on_dispatch() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let seen = Arc::new(AtomicBool::new(false));
        let seen_in_handler = Arc::clone(&seen);
        let client = WhatsAppBuilder::new()
            .phone_id("277321005464405")
            .token("test-token")
            .verify_token("secret")
            .on_message(move |_ctx, _message| {
                let seen_in_handler = Arc::clone(&seen_in_handler);
                async move {
                    seen_in_handler.store(true, Ordering::SeqCst);
                    None
                }
            })
            .build()
            .unwrap();

        let message = whatsapp_core::message::Message {
            id: whatsapp_core::ids::MessageId::new("wamid.1"),
            from: whatsapp_core::message::FromUser { wa_id: whatsapp_core::ids::WaId::new("972544401243"), name: None },
            recipient_phone_id: whatsapp_core::ids::PhoneId::new("277321005464405"),
            recipient_display_phone: "15550953877".into(),
            timestamp: chrono::DateTime::from_timestamp(1_730_231_903, 0).unwrap(),
            context: None,
            tracker: None,
            payload: whatsapp_core::message::MessageType::Text(whatsapp_core::message::Text { body: "hi".into() }),
        };

        client.inner.pipeline.registry().dispatch_typed(client.clone(), &Update::Message(message)).await;
        assert!(seen.load(Ordering::SeqCst));
    }
}
