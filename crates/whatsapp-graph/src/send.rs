//! Outbound message assembly and the `/<phone_id>/messages` send operation.

use serde::Serialize;
use serde_json::Value;
use whatsapp_core::ids::{MessageId, PhoneId, WaId};
use whatsapp_core::interactive::{FlowButton, InteractiveBody, SectionList};
use whatsapp_core::message::{Contact, Location};
use whatsapp_core::template::TemplateParams;
use whatsapp_core::validation::{limits, validate_buttons, validate_len, validate_sections, ValidationError};

use crate::client::GraphClient;
use crate::error::GraphError;
use crate::media::{self, MediaRef, Resolved};
use crate::sent_message::{SentMessage, SentTemplate};

/// Kind of media attachment being sent, mirroring the provider's `type` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Image.
    Image,
    /// Video.
    Video,
    /// Audio/voice clip.
    Audio,
    /// Arbitrary document.
    Document,
    /// Sticker.
    Sticker,
}

impl MediaKind {
    const fn wire_tag(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Document => "document",
            Self::Sticker => "sticker",
        }
    }
}

/// Whether to use the default `/messages` endpoint or the Marketing-Messages
/// Lite alternate (`/marketing_messages`, with `activity_sharing`).
#[derive(Debug, Clone, Copy, Default)]
pub enum SendEndpoint {
    /// `/<phone_id>/messages` (default).
    #[default]
    Standard,
    /// `/<phone_id>/marketing_messages?activity_sharing=<bool>`.
    MarketingMessagesLite {
        /// Whether to share delivery activity with the template's campaign.
        activity_sharing: bool,
    },
}

/// Common send-time options shared by every message kind.
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// Reply-context message ID, added as top-level `context.message_id`.
    pub reply_to_message_id: Option<MessageId>,
    /// Opaque tracker string, usually a serialized `CallbackData`, attached
    /// as `biz_opaque_callback_data` and echoed back on status updates.
    pub tracker: Option<String>,
    /// Which endpoint to post to.
    pub endpoint: SendEndpoint,
}

#[derive(Serialize)]
struct OutboundEnvelope<'a> {
    messaging_product: &'static str,
    recipient_type: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<TextBody<'a>>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    media: Option<std::collections::HashMap<&'static str, MediaPayload<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    interactive: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    template: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reaction: Option<ReactionBody<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    contacts: Option<&'a [Contact]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<ContextBody<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    biz_opaque_callback_data: Option<&'a str>,
}

#[derive(Serialize)]
struct TextBody<'a> {
    body: &'a str,
    preview_url: bool,
}

#[derive(Serialize)]
struct MediaPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    link: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    caption: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filename: Option<&'a str>,
}

#[derive(Serialize)]
struct ReactionBody<'a> {
    message_id: &'a str,
    emoji: &'a str,
}

#[derive(Serialize)]
struct ContextBody<'a> {
    message_id: &'a str,
}

#[derive(serde::Deserialize)]
struct SendResponse {
    messages: Vec<SendResponseMessage>,
    contacts: Vec<SendResponseContact>,
}

#[derive(serde::Deserialize)]
struct SendResponseMessage {
    id: String,
}

#[derive(serde::Deserialize)]
struct SendResponseContact {
    wa_id: String,
    #[allow(dead_code)]
    input: String,
}

fn send_path(endpoint: SendEndpoint, phone_id: &PhoneId) -> String {
    match endpoint {
        SendEndpoint::Standard => GraphClient::path_for(phone_id.as_str(), "messages"),
        SendEndpoint::MarketingMessagesLite { activity_sharing } => format!(
            "{}?activity_sharing={activity_sharing}",
            GraphClient::path_for(phone_id.as_str(), "marketing_messages")
        ),
    }
}

async fn post_envelope(
    client: &GraphClient,
    phone_id: &PhoneId,
    to: &WaId,
    kind: &str,
    build: impl FnOnce(&mut OutboundEnvelope<'_>),
    options: &SendOptions,
) -> Result<SentMessage, GraphError> {
    let mut envelope = OutboundEnvelope {
        messaging_product: "whatsapp",
        recipient_type: "individual",
        to: to.as_str(),
        kind,
        text: None,
        media: None,
        interactive: None,
        template: None,
        reaction: None,
        location: None,
        contacts: None,
        context: options
            .reply_to_message_id
            .as_ref()
            .map(|id| ContextBody { message_id: id.as_str() }),
        biz_opaque_callback_data: options.tracker.as_deref(),
    };
    build(&mut envelope);

    let path = send_path(options.endpoint, phone_id);
    let response: SendResponse = client.post_json(&path, &envelope).await?;

    let message_id = response
        .messages
        .into_iter()
        .next()
        .map(|m| MessageId::new(m.id))
        .ok_or_else(|| GraphError::MediaResolution("send response carried no message id".into()))?;
    let to_user = response
        .contacts
        .into_iter()
        .next()
        .map(|c| WaId::new(c.wa_id))
        .unwrap_or_else(|| to.clone());

    Ok(SentMessage::new(message_id, phone_id.clone(), to_user))
}

/// Send a plain text message.
///
/// # Errors
///
/// Returns [`GraphError::Provider`] for a rejected send.
pub async fn send_text(
    client: &GraphClient,
    phone_id: &PhoneId,
    to: &WaId,
    body: &str,
    preview_url: bool,
    options: &SendOptions,
) -> Result<SentMessage, GraphError> {
    post_envelope(
        client,
        phone_id,
        to,
        "text",
        |env| env.text = Some(TextBody { body, preview_url }),
        options,
    )
    .await
}

/// Send a media attachment (image/video/audio/document/sticker).
///
/// # Errors
///
/// Returns [`GraphError::MediaResolution`] if the attachment cannot be
/// resolved to an ID/link, or [`GraphError::Provider`] for a rejected send.
pub async fn send_media(
    client: &GraphClient,
    phone_id: &PhoneId,
    to: &WaId,
    kind: MediaKind,
    media: MediaRef,
    caption: Option<&str>,
    filename: Option<&str>,
    options: &SendOptions,
) -> Result<SentMessage, GraphError> {
    let resolved = media::resolve(client, phone_id, media).await?;
    let (id, link) = match &resolved {
        Resolved::Id(id) => (Some(id.as_str()), None),
        Resolved::Link(url) => (None, Some(url.as_str())),
    };

    let wire_tag = kind.wire_tag();
    post_envelope(
        client,
        phone_id,
        to,
        wire_tag,
        |env| {
            let mut inner = std::collections::HashMap::new();
            inner.insert(
                wire_tag,
                MediaPayload { id, link, caption, filename },
            );
            env.media = Some(inner);
        },
        options,
    )
    .await
}

/// Send an interactive message (buttons, list, flow, location request, call permission request).
///
/// # Errors
///
/// Returns [`GraphError::Validation`] if `body`, `header`, `text`, or `footer`
/// violate a boundary limit, or [`GraphError::Provider`] for a rejected send.
pub async fn send_interactive(
    client: &GraphClient,
    phone_id: &PhoneId,
    to: &WaId,
    body: &InteractiveBody,
    header: Option<Value>,
    text: &str,
    footer: Option<&str>,
    options: &SendOptions,
) -> Result<SentMessage, GraphError> {
    let assembled = assemble_interactive(body, header, text, footer)?;
    post_envelope(
        client,
        phone_id,
        to,
        "interactive",
        |env| env.interactive = Some(assembled),
        options,
    )
    .await
}

fn assemble_interactive(
    body: &InteractiveBody,
    header: Option<Value>,
    text: &str,
    footer: Option<&str>,
) -> Result<Value, ValidationError> {
    validate_len("body", text, limits::MAX_BODY_LEN)?;
    if let Some(footer_text) = footer {
        validate_len("footer", footer_text, limits::MAX_FOOTER_LEN)?;
    }
    if let Some(header_text) = header.as_ref().and_then(|h| h.get("text")).and_then(Value::as_str) {
        validate_len("header", header_text, limits::MAX_HEADER_LEN)?;
    }

    let (kind, action) = match body {
        InteractiveBody::Buttons(buttons) => {
            let titles_and_data: Vec<(&str, &str)> =
                buttons.iter().map(|b| (b.title.as_str(), b.callback_data.as_str())).collect();
            validate_buttons(&titles_and_data)?;
            (
                "button",
                serde_json::json!({
                    "buttons": buttons.iter().map(|b| serde_json::json!({
                        "type": "reply",
                        "reply": {"id": b.callback_data, "title": b.title},
                    })).collect::<Vec<_>>(),
                }),
            )
        }
        InteractiveBody::List(list) => ("list", assemble_list_action(list)?),
        InteractiveBody::Flow(flow) => ("flow", assemble_flow_action(flow)),
        InteractiveBody::LocationRequest => ("location_request_message", serde_json::json!({"name": "send_location"})),
        InteractiveBody::CallPermissionRequest => ("voice_call", serde_json::json!({"name": "call_permission_request"})),
    };

    let mut value = serde_json::json!({
        "type": kind,
        "body": {"text": text},
        "action": action,
    });
    if let Some(header) = header {
        value["header"] = header;
    }
    if let Some(footer) = footer {
        value["footer"] = serde_json::json!({"text": footer});
    }
    Ok(value)
}

fn assemble_list_action(list: &SectionList) -> Result<Value, ValidationError> {
    let rows_for_validation: Vec<Vec<(&str, &str, Option<&str>)>> = list
        .sections
        .iter()
        .map(|s| {
            s.rows
                .iter()
                .map(|r| (r.title.as_str(), r.callback_data.as_str(), r.description.as_deref()))
                .collect()
        })
        .collect();
    validate_sections(&rows_for_validation)?;

    Ok(serde_json::json!({
        "button": list.button_title,
        "sections": list.sections.iter().map(|s| serde_json::json!({
            "title": s.title,
            "rows": s.rows.iter().map(|r| serde_json::json!({
                "id": r.callback_data,
                "title": r.title,
                "description": r.description,
            })).collect::<Vec<_>>(),
        })).collect::<Vec<_>>(),
    }))
}

fn assemble_flow_action(flow: &FlowButton) -> Value {
    let mode = if flow.draft { "draft" } else { "published" };
    serde_json::json!({
        "name": "flow",
        "parameters": {
            "flow_message_version": "3",
            "flow_id": flow.flow_id.as_str(),
            "flow_cta": flow.title,
            "mode": mode,
            "flow_action": "navigate",
            "flow_action_payload": {
                "screen": flow.flow_screen,
                "data": flow.flow_action_payload,
            },
        },
    })
}

/// Send a named, approved template.
///
/// # Errors
///
/// Returns [`GraphError::Provider`] for a rejected send.
pub async fn send_template(
    client: &GraphClient,
    phone_id: &PhoneId,
    to: &WaId,
    params: &TemplateParams,
    options: &SendOptions,
) -> Result<SentTemplate, GraphError> {
    let template_value = serde_json::json!({
        "name": params.name,
        "language": {"code": params.language},
        "components": params.components,
    });
    let sent = post_envelope(
        client,
        phone_id,
        to,
        "template",
        |env| env.template = Some(template_value),
        options,
    )
    .await?;
    Ok(SentTemplate::new(sent, params.name.clone()))
}

/// React to (or un-react, with an empty `emoji`) a previously sent message.
///
/// # Errors
///
/// Returns [`GraphError::Provider`] for a rejected send.
pub async fn send_reaction(
    client: &GraphClient,
    phone_id: &PhoneId,
    to: &WaId,
    message_id: &MessageId,
    emoji: &str,
    options: &SendOptions,
) -> Result<SentMessage, GraphError> {
    post_envelope(
        client,
        phone_id,
        to,
        "reaction",
        |env| {
            env.reaction = Some(ReactionBody {
                message_id: message_id.as_str(),
                emoji,
            });
        },
        options,
    )
    .await
}

/// Share a geographic location.
///
/// # Errors
///
/// Returns [`GraphError::Provider`] for a rejected send.
pub async fn send_location(
    client: &GraphClient,
    phone_id: &PhoneId,
    to: &WaId,
    location: Location,
    options: &SendOptions,
) -> Result<SentMessage, GraphError> {
    post_envelope(
        client,
        phone_id,
        to,
        "location",
        |env| env.location = Some(location),
        options,
    )
    .await
}

/// Share one or more contact cards.
///
/// # Errors
///
/// Returns [`GraphError::Provider`] for a rejected send.
pub async fn send_contacts(
    client: &GraphClient,
    phone_id: &PhoneId,
    to: &WaId,
    contacts: &[Contact],
    options: &SendOptions,
) -> Result<SentMessage, GraphError> {
    post_envelope(
        client,
        phone_id,
        to,
        "contacts",
        |env| env.contacts = Some(contacts),
        options,
    )
    .await
}

#[derive(Serialize)]
struct StatusUpdateRequest<'a> {
    messaging_product: &'static str,
    status: &'static str,
    message_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    typing_indicator: Option<TypingIndicator>,
}

#[derive(Serialize)]
struct TypingIndicator {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(serde::Deserialize)]
struct StatusUpdateResponse {
    #[allow(dead_code)]
    success: bool,
}

/// Mark an inbound message as read, optionally showing the typing indicator.
///
/// # Errors
///
/// Returns [`GraphError::Provider`] for a rejected request.
pub async fn mark_read(
    client: &GraphClient,
    phone_id: &PhoneId,
    message_id: &MessageId,
    show_typing_indicator: bool,
) -> Result<(), GraphError> {
    let request = StatusUpdateRequest {
        messaging_product: "whatsapp",
        status: "read",
        message_id: message_id.as_str(),
        typing_indicator: show_typing_indicator.then_some(TypingIndicator { kind: "text" }),
    };
    let path = GraphClient::path_for(phone_id.as_str(), "messages");
    let _: StatusUpdateResponse = client.post_json(&path, &request).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_action_serializes_as_reply_shape() {
        let body = InteractiveBody::Buttons(vec![whatsapp_core::interactive::Button::new("yes", "Yes")]);
        let value = assemble_interactive(&body, None, "Are you sure?", None).unwrap();
        assert_eq!(value["type"], "button");
        assert_eq!(value["action"]["buttons"][0]["type"], "reply");
        assert_eq!(value["action"]["buttons"][0]["reply"]["id"], "yes");
    }

    #[test]
    fn button_body_matches_full_expected_shape() {
        use pretty_assertions::assert_eq;

        let body = InteractiveBody::Buttons(vec![whatsapp_core::interactive::Button::new("yes", "Yes")]);
        let value = assemble_interactive(&body, None, "Are you sure?", None).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "type": "button",
                "body": {"text": "Are you sure?"},
                "action": {
                    "buttons": [
                        {"type": "reply", "reply": {"id": "yes", "title": "Yes"}},
                    ],
                },
            })
        );
    }

    #[test]
    fn zero_section_list_is_rejected() {
        let list = SectionList { button_title: "Pick".into(), sections: vec![] };
        let body = InteractiveBody::List(list);
        let err = assemble_interactive(&body, None, "Choose one", None).unwrap_err();
        assert!(matches!(err, ValidationError::Empty { field: "sections" }));
    }

    #[test]
    fn oversized_button_title_is_rejected() {
        let body = InteractiveBody::Buttons(vec![whatsapp_core::interactive::Button::new("yes", "a".repeat(21))]);
        let err = assemble_interactive(&body, None, "Are you sure?", None).unwrap_err();
        assert!(matches!(err, ValidationError::TooLong { field: "button title", .. }));
    }

    #[test]
    fn oversized_callback_data_is_rejected() {
        let body =
            InteractiveBody::Buttons(vec![whatsapp_core::interactive::Button::new("x".repeat(257), "Yes")]);
        let err = assemble_interactive(&body, None, "Are you sure?", None).unwrap_err();
        assert!(matches!(err, ValidationError::TooLong { field: "button callback_data", .. }));
    }

    #[test]
    fn oversized_body_text_is_rejected() {
        let body = InteractiveBody::Buttons(vec![whatsapp_core::interactive::Button::new("yes", "Yes")]);
        let err = assemble_interactive(&body, None, &"a".repeat(4097), None).unwrap_err();
        assert!(matches!(err, ValidationError::TooLong { field: "body", .. }));
    }

    #[test]
    fn flow_action_uses_draft_mode_when_flagged() {
        let flow = FlowButton {
            title: "Start".into(),
            flow_id: whatsapp_core::ids::FlowId::new("123"),
            flow_screen: Some("WELCOME".into()),
            flow_action_payload: None,
            draft: true,
        };
        let value = assemble_flow_action(&flow);
        assert_eq!(value["mode"], "draft");
    }
}
