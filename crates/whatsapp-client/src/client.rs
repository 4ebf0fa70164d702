//! The unified client: one value per logical WhatsApp sender, owning its
//! Graph session, webhook pipeline, and registered Flow endpoints.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use serde::{Deserialize, Serialize};

use whatsapp_core::config::ClientConfig;
use whatsapp_core::ids::{CallId, FlowId, MediaId, MessageId, PhoneId, TemplateId, WabaId, WaId};
use whatsapp_core::interactive::InteractiveBody;
use whatsapp_core::message::{Contact, Location};
use whatsapp_core::template::{AuthTemplateDeclaration, TemplateDeclaration, TemplateParams};
use whatsapp_flows::FlowProcessor;
use whatsapp_graph::calls::CallSession;
use whatsapp_graph::flows::{CreateFlowRequest, FlowMetadata};
use whatsapp_graph::media::{MediaRef, MediaUrlInfo};
use whatsapp_graph::send::{MediaKind, SendOptions};
use whatsapp_graph::sent_message::{SentMessage, SentTemplate};
use whatsapp_graph::templates::TemplateCreated;
use whatsapp_graph::GraphClient;
use whatsapp_webhook::WebhookPipeline;

use crate::error::ClientError;

/// Shared state behind every clone of a [`WhatsApp`] handle.
pub(crate) struct Inner {
    pub(crate) graph: GraphClient,
    pub(crate) config: ClientConfig,
    pub(crate) pipeline: Arc<WebhookPipeline<WhatsApp>>,
    pub(crate) flows: HashMap<String, Arc<FlowProcessor>>,
}

/// A unified WhatsApp Cloud API client.
///
/// Cheaply [`Clone`]-able (an `Arc` handle); the clone passed into handler
/// callbacks and the webhook router is this same shared state, never a
/// second session.
#[derive(Clone)]
pub struct WhatsApp {
    pub(crate) inner: Arc<Inner>,
}

impl WhatsApp {
    /// The phone ID this client sends from.
    #[must_use]
    pub fn phone_id(&self) -> &PhoneId {
        &self.inner.config.phone_id
    }

    /// The underlying Graph façade, for calls this facade doesn't wrap.
    #[must_use]
    pub fn graph(&self) -> &GraphClient {
        &self.inner.graph
    }

    /// The resolved configuration this client was built with.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Send a plain text message.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Graph`] if the provider rejects the send.
    pub async fn send_text(&self, to: &WaId, body: &str, preview_url: bool, options: &SendOptions) -> Result<SentMessage, ClientError> {
        whatsapp_graph::send::send_text(&self.inner.graph, self.phone_id(), to, body, preview_url, options)
            .await
            .map_err(Into::into)
    }

    /// Send a media attachment, resolving `media` (uploading local content if needed).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Graph`] if resolution or the send itself fails.
    #[allow(clippy::too_many_arguments)]
    pub async fn send_media(
        &self,
        to: &WaId,
        kind: MediaKind,
        media: MediaRef,
        caption: Option<&str>,
        filename: Option<&str>,
        options: &SendOptions,
    ) -> Result<SentMessage, ClientError> {
        whatsapp_graph::send::send_media(&self.inner.graph, self.phone_id(), to, kind, media, caption, filename, options)
            .await
            .map_err(Into::into)
    }

    /// Send an interactive message (buttons, list, flow launcher, location request, call permission request).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Graph`] if the provider rejects the send.
    pub async fn send_interactive(
        &self,
        to: &WaId,
        body: &InteractiveBody,
        header: Option<serde_json::Value>,
        text: &str,
        footer: Option<&str>,
        options: &SendOptions,
    ) -> Result<SentMessage, ClientError> {
        whatsapp_graph::send::send_interactive(&self.inner.graph, self.phone_id(), to, body, header, text, footer, options)
            .await
            .map_err(Into::into)
    }

    /// Send an approved template.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Graph`] if the provider rejects the send.
    pub async fn send_template(&self, to: &WaId, params: &TemplateParams, options: &SendOptions) -> Result<SentTemplate, ClientError> {
        whatsapp_graph::send::send_template(&self.inner.graph, self.phone_id(), to, params, options)
            .await
            .map_err(Into::into)
    }

    /// React to (or, with an empty `emoji`, un-react to) a previously received message.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Graph`] if the provider rejects the send.
    pub async fn send_reaction(&self, to: &WaId, message_id: &MessageId, emoji: &str, options: &SendOptions) -> Result<SentMessage, ClientError> {
        whatsapp_graph::send::send_reaction(&self.inner.graph, self.phone_id(), to, message_id, emoji, options)
            .await
            .map_err(Into::into)
    }

    /// Share a geographic location.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Graph`] if the provider rejects the send.
    pub async fn send_location(&self, to: &WaId, location: Location, options: &SendOptions) -> Result<SentMessage, ClientError> {
        whatsapp_graph::send::send_location(&self.inner.graph, self.phone_id(), to, location, options)
            .await
            .map_err(Into::into)
    }

    /// Share one or more contact cards.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Graph`] if the provider rejects the send.
    pub async fn send_contacts(&self, to: &WaId, contacts: &[Contact], options: &SendOptions) -> Result<SentMessage, ClientError> {
        whatsapp_graph::send::send_contacts(&self.inner.graph, self.phone_id(), to, contacts, options)
            .await
            .map_err(Into::into)
    }

    /// Mark an inbound message as read, optionally showing the typing indicator.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Graph`] if the provider rejects the request.
    pub async fn mark_read(&self, message_id: &MessageId, show_typing_indicator: bool) -> Result<(), ClientError> {
        whatsapp_graph::send::mark_read(&self.inner.graph, self.phone_id(), message_id, show_typing_indicator)
            .await
            .map_err(Into::into)
    }

    /// Upload raw bytes to this client's media store, without sending them.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Graph`] on a rejected or failed upload.
    pub async fn upload_media(&self, data: Vec<u8>, mime_type: &str, filename: Option<&str>) -> Result<MediaId, ClientError> {
        whatsapp_graph::media::upload(&self.inner.graph, self.phone_id(), data, mime_type, filename)
            .await
            .map_err(Into::into)
    }

    /// Resolve a media ID to a signed, short-lived download URL.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Graph`] if the media ID is unknown or expired.
    pub async fn media_url(&self, media_id: &MediaId) -> Result<MediaUrlInfo, ClientError> {
        whatsapp_graph::media::resolve_url(&self.inner.graph, media_id).await.map_err(Into::into)
    }

    /// Download the raw bytes behind a signed media URL.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Graph`] on a transport failure.
    pub async fn download_media(&self, info: &MediaUrlInfo) -> Result<Vec<u8>, ClientError> {
        whatsapp_graph::media::download(&self.inner.graph, info).await.map_err(Into::into)
    }

    /// Delete a previously uploaded media handle.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Graph`] if the handle is unknown.
    pub async fn delete_media(&self, media_id: &MediaId) -> Result<(), ClientError> {
        whatsapp_graph::media::delete(&self.inner.graph, media_id).await.map_err(Into::into)
    }

    /// Create a message template on the configured WABA.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if no WABA ID is configured, or
    /// [`ClientError::Graph`] if the provider rejects the declaration.
    pub async fn create_template(&self, declaration: &TemplateDeclaration) -> Result<TemplateCreated, ClientError> {
        whatsapp_graph::templates::create(&self.inner.graph, self.waba_id()?, declaration)
            .await
            .map_err(Into::into)
    }

    /// Create an authentication (OTP) template across several languages.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if no WABA ID is configured, or
    /// [`ClientError::Graph`] if the provider rejects the declaration.
    pub async fn create_auth_template(&self, declaration: &AuthTemplateDeclaration) -> Result<TemplateCreated, ClientError> {
        whatsapp_graph::templates::create_auth_template(&self.inner.graph, self.waba_id()?, declaration)
            .await
            .map_err(Into::into)
    }

    /// List all templates registered to the configured WABA.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if no WABA ID is configured, or
    /// [`ClientError::Graph`] on failure.
    pub async fn list_templates(&self) -> Result<Vec<TemplateDeclaration>, ClientError> {
        whatsapp_graph::templates::list(&self.inner.graph, self.waba_id()?).await.map_err(Into::into)
    }

    /// Update an existing template's components.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Graph`] if the provider rejects the update.
    pub async fn update_template(&self, template_id: &TemplateId, declaration: &TemplateDeclaration) -> Result<(), ClientError> {
        whatsapp_graph::templates::update(&self.inner.graph, template_id, declaration).await.map_err(Into::into)
    }

    /// Delete a template by name.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if no WABA ID is configured, or
    /// [`ClientError::Graph`] if no matching template exists.
    pub async fn delete_template(&self, name: &str, hsm_id: Option<&TemplateId>) -> Result<(), ClientError> {
        whatsapp_graph::templates::delete(&self.inner.graph, self.waba_id()?, name, hsm_id).await.map_err(Into::into)
    }

    /// Lift a paused template back to active sending.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Graph`] if the template isn't currently paused.
    pub async fn unpause_template(&self, template_id: &TemplateId) -> Result<(), ClientError> {
        whatsapp_graph::templates::unpause(&self.inner.graph, template_id).await.map_err(Into::into)
    }

    /// Create a draft flow.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if no WABA ID is configured, or
    /// [`ClientError::Graph`] on rejection.
    pub async fn create_flow(&self, request: &CreateFlowRequest<'_>) -> Result<FlowId, ClientError> {
        whatsapp_graph::flows::create(&self.inner.graph, self.waba_id()?, request).await.map_err(Into::into)
    }

    /// Fetch a flow's current metadata.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Graph`] if the flow doesn't exist.
    pub async fn get_flow(&self, flow_id: &FlowId) -> Result<FlowMetadata, ClientError> {
        whatsapp_graph::flows::get(&self.inner.graph, flow_id).await.map_err(Into::into)
    }

    /// Upload a flow's JSON layout asset.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Graph`] if the asset fails validation.
    pub async fn upload_flow_asset(&self, flow_id: &FlowId, flow_json: &serde_json::Value) -> Result<(), ClientError> {
        whatsapp_graph::flows::upload_asset(&self.inner.graph, flow_id, flow_json).await.map_err(Into::into)
    }

    /// Publish a draft flow.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Graph`] if the flow has outstanding validation errors.
    pub async fn publish_flow(&self, flow_id: &FlowId) -> Result<(), ClientError> {
        whatsapp_graph::flows::publish(&self.inner.graph, flow_id).await.map_err(Into::into)
    }

    /// Deprecate a published flow.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Graph`] if the flow is not currently published.
    pub async fn deprecate_flow(&self, flow_id: &FlowId) -> Result<(), ClientError> {
        whatsapp_graph::flows::deprecate(&self.inner.graph, flow_id).await.map_err(Into::into)
    }

    /// Delete a draft flow.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Graph`] if the flow is not in `DRAFT` status.
    pub async fn delete_flow(&self, flow_id: &FlowId) -> Result<(), ClientError> {
        whatsapp_graph::flows::delete(&self.inner.graph, flow_id).await.map_err(Into::into)
    }

    /// Place an outbound call, offering an SDP session.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Graph`] on rejection.
    pub async fn initiate_call(&self, to: &str, session: &CallSession) -> Result<CallId, ClientError> {
        whatsapp_graph::calls::initiate(&self.inner.graph, self.phone_id(), to, session).await.map_err(Into::into)
    }

    /// Pre-accept an inbound call.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Graph`] on rejection.
    pub async fn pre_accept_call(&self, call_id: &CallId, session: &CallSession) -> Result<(), ClientError> {
        whatsapp_graph::calls::pre_accept(&self.inner.graph, self.phone_id(), call_id, session).await.map_err(Into::into)
    }

    /// Accept an inbound call.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Graph`] on rejection.
    pub async fn accept_call(&self, call_id: &CallId, session: &CallSession) -> Result<(), ClientError> {
        whatsapp_graph::calls::accept(&self.inner.graph, self.phone_id(), call_id, session).await.map_err(Into::into)
    }

    /// Reject an inbound call.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Graph`] on rejection.
    pub async fn reject_call(&self, call_id: &CallId) -> Result<(), ClientError> {
        whatsapp_graph::calls::reject(&self.inner.graph, self.phone_id(), call_id).await.map_err(Into::into)
    }

    /// Terminate an in-progress call.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Graph`] on rejection.
    pub async fn terminate_call(&self, call_id: &CallId) -> Result<(), ClientError> {
        whatsapp_graph::calls::terminate(&self.inner.graph, self.phone_id(), call_id).await.map_err(Into::into)
    }

    /// Register this phone number for Cloud API use.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Graph`] on rejection.
    pub async fn register_phone_number(&self, two_step_pin: Option<&str>) -> Result<(), ClientError> {
        whatsapp_graph::subscriptions::register(&self.inner.graph, self.phone_id(), two_step_pin).await.map_err(Into::into)
    }

    /// Deregister this phone number.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Graph`] on rejection.
    pub async fn deregister_phone_number(&self) -> Result<(), ClientError> {
        whatsapp_graph::subscriptions::deregister(&self.inner.graph, self.phone_id()).await.map_err(Into::into)
    }

    fn waba_id(&self) -> Result<&WabaId, ClientError> {
        self.inner
            .config
            .business_account_id
            .as_ref()
            .ok_or(ClientError::Config(whatsapp_core::config::ConfigError::MissingField("business_account_id")))
    }

    /// Run the callback-URL bootstrap (app access token + subscription
    /// registration), honoring the configured startup delay.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if `app_id`/`app_secret`/`callback_url`
    /// aren't all configured, or [`ClientError::Graph`] if either Graph call fails.
    pub async fn bootstrap_webhook_subscription(&self) -> Result<(), ClientError> {
        let app_id = self
            .inner
            .config
            .app_id
            .as_ref()
            .ok_or(ClientError::Config(whatsapp_core::config::ConfigError::MissingField("app_id")))?;
        let app_secret = self
            .inner
            .config
            .app_secret
            .as_ref()
            .ok_or(ClientError::Config(whatsapp_core::config::ConfigError::MissingField("app_secret")))?;
        let callback_url = self
            .inner
            .config
            .callback_url
            .as_deref()
            .ok_or(ClientError::Config(whatsapp_core::config::ConfigError::MissingField("callback_url")))?;

        whatsapp_webhook::bootstrap_subscription(
            &self.inner.graph,
            app_id,
            app_secret.expose(),
            callback_url,
            &self.inner.config.verify_token,
            &self.inner.config.webhook_fields,
            Duration::from_secs(self.inner.config.webhook_challenge_delay_secs),
        )
        .await
        .map_err(Into::into)
    }

    /// Build the combined axum router: the webhook's challenge/update routes
    /// plus one POST route per registered Flow endpoint.
    #[must_use]
    pub fn router(&self) -> Router {
        let mut router = whatsapp_webhook::router(Arc::clone(&self.inner.pipeline), self.clone());
        for (path, processor) in &self.inner.flows {
            router = router.route(path, post(flow_handler).with_state(Arc::clone(processor)));
        }
        router
    }
}

#[derive(Deserialize)]
struct FlowRequestEnvelope {
    encrypted_flow_data: String,
    encrypted_aes_key: String,
    initial_vector: String,
}

#[derive(Serialize)]
struct FlowErrorBody {
    error: String,
}

async fn flow_handler(State(processor): State<Arc<FlowProcessor>>, axum::Json(envelope): axum::Json<FlowRequestEnvelope>) -> Response {
    match processor
        .handle_request(&envelope.encrypted_flow_data, &envelope.encrypted_aes_key, &envelope.initial_vector)
        .await
    {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "flow request rejected");
            let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::BAD_REQUEST);
            (status, axum::Json(FlowErrorBody { error: err.to_string() })).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::WhatsAppBuilder;

    fn test_client() -> WhatsApp {
        WhatsAppBuilder::new()
            .phone_id("277321005464405")
            .token("test-token")
            .verify_token("secret")
            .webhook_endpoint("/webhook")
            .build()
            .unwrap()
    }

    #[test]
    fn router_exposes_webhook_routes() {
        let client = test_client();
        let _router = client.router();
    }
}
