//! Decode a [`WebhookEnvelope`] into zero or more typed [`Update`]s.
//!
//! Implements the classification table: `messages` is overloaded and must be
//! expanded by inspecting `messages[].type` (and, for interactive replies,
//! `interactive.type`); every other field maps directly to one update kind.
//! Providers currently send one entry and one change per entry, but the
//! schema permits more, so every entry/change is decoded rather than only
//! `entry[0].changes[0]`.

use chrono::{DateTime, Utc};
use whatsapp_core::ids::{CallId, MediaId, MessageId, PhoneId, TemplateId, WaId};
use whatsapp_core::interactive::{CallbackButton, CallbackSelection, FlowCompletion};
use whatsapp_core::message::{
    Contact, FromUser, Location, Media, MediaKind, Message, MessageContext, MessageError, MessageType, Order,
    OrderItem, Reaction, Text,
};
use whatsapp_core::template::{TemplateCategory, TemplateQuality, TemplateStatus};
use whatsapp_core::update::{
    CallDirection, CallEvent, CallStatus, ChatOpened, ConversationInfo, DeliveryError, DeliveryStatus, IdentityChange,
    MessageStatus, PhoneNumberChange, TemplateCategoryUpdate, TemplateQualityUpdate, TemplateStatusUpdate, Update,
    UserPreferencesUpdate,
};

use crate::envelope::{
    CallsValue, MessagesValue, TemplateCategoryValue, TemplateQualityValue, TemplateStatusValue,
    UserPreferencesValue, WebhookEnvelope, WireCall, WireChange, WireContext, WireError, WireMessage,
};

/// One decoded `entry[].changes[]` element.
#[derive(Debug, Clone)]
pub struct DecodedUpdate {
    /// The subscribed field this change belonged to.
    pub field: String,
    /// The typed update, or `None` if the decoder couldn't classify it
    /// (unknown field, unknown inner type, or dropped by the phone-ID filter).
    pub update: Option<Update>,
    /// The original change payload, for raw-update handlers.
    pub raw: serde_json::Value,
}

/// Decode every `entry[].changes[]` element in the envelope.
///
/// `filter_phone_id`, when set, drops `messages`-field updates whose
/// `metadata.phone_number_id` doesn't match (raw-update handlers still see
/// them, since filtering only suppresses the typed `update` field here).
#[must_use]
pub fn decode_envelope(envelope: &WebhookEnvelope, filter_phone_id: Option<&PhoneId>) -> Vec<DecodedUpdate> {
    let mut out = Vec::new();
    for entry in &envelope.entry {
        for change in &entry.changes {
            out.push(decode_change(change, filter_phone_id));
        }
    }
    out
}

fn decode_change(change: &WireChange, filter_phone_id: Option<&PhoneId>) -> DecodedUpdate {
    let update = decode_change_inner(change, filter_phone_id);
    DecodedUpdate {
        field: change.field.clone(),
        update,
        raw: change.value.clone(),
    }
}

fn decode_change_inner(change: &WireChange, filter_phone_id: Option<&PhoneId>) -> Option<Update> {
    match change.field.as_str() {
        "messages" => decode_messages_field(&change.value, filter_phone_id),
        "message_template_status_update" => decode_template_status(&change.value),
        "message_template_quality_update" => decode_template_quality(&change.value),
        "message_template_category_update" => decode_template_category(&change.value),
        "calls" => decode_calls(&change.value),
        "user_preferences" => decode_user_preferences(&change.value),
        other => {
            tracing::warn!(field = other, "unrecognized webhook field, dropping to raw path");
            None
        }
    }
}

fn decode_messages_field(value: &serde_json::Value, filter_phone_id: Option<&PhoneId>) -> Option<Update> {
    let parsed: MessagesValue = match serde_json::from_value(value.clone()) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "malformed `messages` field value");
            return None;
        }
    };

    let phone_id = parsed
        .metadata
        .as_ref()
        .and_then(|m| m.phone_number_id.clone())
        .map(PhoneId::new);

    if let Some(filter) = filter_phone_id {
        if phone_id.as_ref() != Some(filter) {
            return None;
        }
    }

    // Tie-break: `messages` wins when both keys are present.
    if let Some(message) = parsed.messages.first() {
        let sender_name = parsed.contacts.first().and_then(|c| c.profile.as_ref()).and_then(|p| p.name.clone());
        return decode_message(message, phone_id?, parsed.metadata.as_ref()?.display_phone_number.clone()?, sender_name);
    }

    if let Some(status) = parsed.statuses.first() {
        return decode_status_entry(status, phone_id?);
    }

    None
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<i64>()
        .ok()
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .unwrap_or_else(Utc::now)
}

fn decode_context(context: &Option<WireContext>) -> Option<MessageContext> {
    context.as_ref().map(|c| MessageContext {
        id: MessageId::new(c.id.clone()),
        from: c.from.clone().map(WaId::new),
        forwarded: c.forwarded,
        frequently_forwarded: c.frequently_forwarded,
    })
}

fn decode_errors(errors: &Option<Vec<WireError>>) -> MessageError {
    errors
        .as_ref()
        .and_then(|e| e.first())
        .map(|e| MessageError {
            code: e.code,
            title: e.title.clone(),
            message: e.message.clone(),
        })
        .unwrap_or(MessageError {
            code: 0,
            title: "unrecognized message type".to_string(),
            message: None,
        })
}

fn decode_message(message: &WireMessage, recipient_phone_id: PhoneId, recipient_display_phone: String, sender_name: Option<String>) -> Option<Update> {
    match message.kind.as_str() {
        "interactive" => return decode_interactive(message, recipient_phone_id, sender_name),
        "button" => {
            let button = message.button.as_ref()?;
            return Some(Update::CallbackButton(CallbackButton {
                message_id: MessageId::new(message.id.clone()),
                from: WaId::new(message.from.clone()),
                data: button.payload.clone(),
                title: button.text.clone(),
            }));
        }
        "request_welcome" => {
            return Some(Update::ChatOpened(ChatOpened {
                from: WaId::new(message.from.clone()),
                recipient_phone_id,
                timestamp: parse_timestamp(&message.timestamp),
            }));
        }
        "system" => return decode_system(message),
        _ => {}
    }

    let payload = match message.kind.as_str() {
        "text" => MessageType::Text(Text { body: message.text.as_ref()?.body.clone() }),
        "image" => MessageType::Image(decode_media(message.image.as_ref()?.id.clone(), message.image.as_ref()?.mime_type.clone(), message.image.as_ref()?.sha256.clone(), message.image.as_ref()?.caption.clone(), None, MediaKind::Image)),
        "video" => MessageType::Video(decode_media(message.video.as_ref()?.id.clone(), message.video.as_ref()?.mime_type.clone(), message.video.as_ref()?.sha256.clone(), message.video.as_ref()?.caption.clone(), None, MediaKind::Video)),
        "audio" => {
            let audio = message.audio.as_ref()?;
            MessageType::Audio(Media {
                kind: MediaKind::Audio,
                id: MediaId::new(audio.id.clone()),
                mime_type: audio.mime_type.clone(),
                sha256: None,
                caption: None,
                filename: None,
                voice: audio.voice.unwrap_or(false),
                animated: false,
            })
        }
        "document" => {
            let doc = message.document.as_ref()?;
            MessageType::Document(Media {
                kind: MediaKind::Document,
                id: MediaId::new(doc.id.clone()),
                mime_type: doc.mime_type.clone(),
                sha256: None,
                caption: doc.caption.clone(),
                filename: doc.filename.clone(),
                voice: false,
                animated: false,
            })
        }
        "sticker" => {
            let sticker = message.sticker.as_ref()?;
            MessageType::Sticker(Media {
                kind: MediaKind::Sticker,
                id: MediaId::new(sticker.id.clone()),
                mime_type: sticker.mime_type.clone(),
                sha256: None,
                caption: None,
                filename: None,
                voice: false,
                animated: sticker.animated.unwrap_or(false),
            })
        }
        "location" => {
            let loc = message.location.as_ref()?;
            MessageType::Location(Location { latitude: loc.latitude, longitude: loc.longitude })
        }
        "contacts" => MessageType::Contacts(
            message
                .contacts
                .clone()
                .unwrap_or_default()
                .into_iter()
                .map(|raw| Contact { raw })
                .collect(),
        ),
        "reaction" => {
            let reaction = message.reaction.as_ref()?;
            MessageType::Reaction(Reaction {
                message_id: MessageId::new(reaction.message_id.clone()),
                emoji: reaction.emoji.clone(),
            })
        }
        "order" => {
            let order = message.order.as_ref()?;
            MessageType::Order(Order {
                catalog_id: order.catalog_id.clone(),
                text: order.text.clone(),
                product_items: order
                    .product_items
                    .iter()
                    .filter_map(|v| serde_json::from_value::<OrderItem>(v.clone()).ok())
                    .collect(),
            })
        }
        _ => MessageType::Unsupported(decode_errors(&message.errors)),
    };

    Some(Update::Message(Message {
        id: MessageId::new(message.id.clone()),
        from: FromUser { wa_id: WaId::new(message.from.clone()), name: sender_name },
        recipient_phone_id,
        recipient_display_phone,
        timestamp: parse_timestamp(&message.timestamp),
        context: decode_context(&message.context),
        tracker: message.biz_opaque_callback_data.clone(),
        payload,
    }))
}

fn decode_media(id: String, mime_type: String, sha256: Option<String>, caption: Option<String>, filename: Option<String>, kind: MediaKind) -> Media {
    Media { kind, id: MediaId::new(id), mime_type, sha256, caption, filename, voice: false, animated: false }
}

fn decode_interactive(message: &WireMessage, recipient_phone_id: PhoneId, sender_name: Option<String>) -> Option<Update> {
    let interactive = message.interactive.as_ref()?;
    match interactive.kind.as_deref() {
        Some("button_reply") => {
            let reply = interactive.button_reply.as_ref()?;
            Some(Update::CallbackButton(CallbackButton {
                message_id: MessageId::new(message.id.clone()),
                from: WaId::new(message.from.clone()),
                data: reply.id.clone(),
                title: reply.title.clone(),
            }))
        }
        Some("list_reply") => {
            let reply = interactive.list_reply.as_ref()?;
            Some(Update::CallbackSelection(CallbackSelection {
                message_id: MessageId::new(message.id.clone()),
                from: WaId::new(message.from.clone()),
                data: reply.id.clone(),
                title: reply.title.clone(),
                description: reply.description.clone(),
            }))
        }
        Some("nfm_reply") => {
            let reply = interactive.nfm_reply.as_ref()?;
            let response = serde_json::from_str(&reply.response_json).unwrap_or(serde_json::Value::Null);
            Some(Update::FlowCompletion(FlowCompletion {
                message_id: MessageId::new(message.id.clone()),
                from: WaId::new(message.from.clone()),
                token: reply.flow_token.clone(),
                response,
            }))
        }
        // The inner type is absent when the message carries only an error.
        _ => Some(Update::Message(Message {
            id: MessageId::new(message.id.clone()),
            from: FromUser { wa_id: WaId::new(message.from.clone()), name: sender_name },
            recipient_phone_id,
            recipient_display_phone: String::new(),
            timestamp: parse_timestamp(&message.timestamp),
            context: decode_context(&message.context),
            tracker: message.biz_opaque_callback_data.clone(),
            payload: MessageType::Unsupported(decode_errors(&message.errors)),
        })),
    }
}

fn decode_system(message: &WireMessage) -> Option<Update> {
    let system = message.system.as_ref()?;
    if system.kind.contains("changed_number") {
        Some(Update::PhoneNumberChange(PhoneNumberChange {
            new_wa_id: system.wa_id.clone().map(WaId::new)?,
            old_wa_id: system.customer.clone().map(WaId::new)?,
        }))
    } else {
        Some(Update::IdentityChange(IdentityChange {
            wa_id: WaId::new(message.from.clone()),
            body: system.body.clone(),
        }))
    }
}

fn parse_delivery_status(raw: &str) -> Option<DeliveryStatus> {
    serde_json::from_value(serde_json::Value::String(raw.to_string())).ok()
}

#[allow(clippy::needless_pass_by_value)]
fn decode_status_entry(status: &crate::envelope::WireStatus, sender_phone_id: PhoneId) -> Option<Update> {
    let delivery_status = parse_delivery_status(&status.status)?;
    let conversation = status.conversation.as_ref().map(|c| ConversationInfo {
        id: c.id.clone(),
        category: c.origin.as_ref().map(|o| o.kind.clone()),
        expiration: c
            .expiration_timestamp
            .as_ref()
            .and_then(|s| s.parse::<i64>().ok())
            .and_then(|ts| DateTime::from_timestamp(ts, 0)),
    });
    let errors = status
        .errors
        .clone()
        .unwrap_or_default()
        .into_iter()
        .map(|e| DeliveryError { code: e.code, title: e.title, message: e.message, error_data: None })
        .collect();

    Some(Update::MessageStatus(MessageStatus {
        message_id: MessageId::new(status.id.clone()),
        recipient: WaId::new(status.recipient_id.clone()),
        sender_phone_id,
        status: delivery_status,
        timestamp: parse_timestamp(&status.timestamp),
        errors,
        conversation,
        tracker: status.biz_opaque_callback_data.clone(),
    }))
}

fn decode_template_status(value: &serde_json::Value) -> Option<Update> {
    let parsed: TemplateStatusValue = serde_json::from_value(value.clone()).ok()?;
    let status: TemplateStatus = serde_json::from_value(serde_json::Value::String(parsed.event.clone())).ok()?;
    Some(Update::TemplateStatusUpdate(TemplateStatusUpdate {
        template_id: TemplateId::new(parsed.message_template_id.to_string()),
        template_name: parsed.message_template_name,
        template_language: parsed.message_template_language,
        status,
        reason: parsed.reason,
    }))
}

fn decode_template_quality(value: &serde_json::Value) -> Option<Update> {
    let parsed: TemplateQualityValue = serde_json::from_value(value.clone()).ok()?;
    let new_quality: TemplateQuality = serde_json::from_value(serde_json::Value::String(parsed.new_quality_score.clone())).ok()?;
    let previous_quality: TemplateQuality = parsed
        .previous_quality_score
        .as_ref()
        .and_then(|s| serde_json::from_value(serde_json::Value::String(s.clone())).ok())
        .unwrap_or(TemplateQuality::Unknown);
    Some(Update::TemplateQualityUpdate(TemplateQualityUpdate {
        template_id: TemplateId::new(parsed.message_template_id.to_string()),
        template_name: parsed.message_template_name,
        new_quality,
        previous_quality,
    }))
}

fn decode_calls(value: &serde_json::Value) -> Option<Update> {
    let parsed: CallsValue = serde_json::from_value(value.clone()).ok()?;
    let call = parsed.calls.first()?;
    let phone_id = parsed
        .metadata
        .as_ref()
        .and_then(|m| m.phone_number_id.clone())
        .map(PhoneId::new)
        .unwrap_or_else(|| PhoneId::new(String::new()));

    if call.event == "connect" {
        let session = call.session.as_ref()?;
        Some(Update::CallEvent(CallEvent {
            call_id: CallId::new(call.id.clone()),
            from: WaId::new(call.from.clone()),
            phone_id,
            direction: decode_call_direction(call),
            session: Some(serde_json::json!({"sdp_type": session.sdp_type, "sdp": session.sdp})),
        }))
    } else {
        Some(Update::CallStatus(CallStatus {
            call_id: CallId::new(call.id.clone()),
            status: call.event.clone(),
            timestamp: parse_timestamp(&call.timestamp),
        }))
    }
}

fn decode_call_direction(call: &WireCall) -> CallDirection {
    match call.direction.as_deref() {
        Some("BUSINESS_INITIATED") => CallDirection::User,
        _ => CallDirection::Business,
    }
}

fn decode_user_preferences(value: &serde_json::Value) -> Option<Update> {
    let parsed: UserPreferencesValue = serde_json::from_value(value.clone()).ok()?;
    let pref = parsed.user_preferences.first()?;
    Some(Update::UserPreferencesUpdate(UserPreferencesUpdate {
        wa_id: WaId::new(pref.wa_id.clone()),
        category: pref.category.clone(),
        value: pref.value.clone(),
    }))
}

fn decode_template_category(value: &serde_json::Value) -> Option<Update> {
    let parsed: TemplateCategoryValue = serde_json::from_value(value.clone()).ok()?;
    let new_category: TemplateCategory = serde_json::from_value(serde_json::Value::String(parsed.new_category.clone())).ok()?;
    let previous_category: TemplateCategory = serde_json::from_value(serde_json::Value::String(parsed.previous_category.clone())).ok()?;
    Some(Update::TemplateCategoryUpdate(TemplateCategoryUpdate {
        template_id: TemplateId::new(parsed.message_template_id.to_string()),
        template_name: parsed.message_template_name,
        new_category,
        previous_category,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::WebhookEnvelope;

    const SEED_BODY: &str = r#"{"object":"whatsapp_business_account","entry":[{"id":"264937493375603","changes":[{"value":{"messaging_product":"whatsapp","metadata":{"display_phone_number":"15550953877","phone_number_id":"277321005464405"},"contacts":[{"profile":{"name":"PyWa Tests"},"wa_id":"972544401243"}],"messages":[{"from":"972544401243","id":"wamid.HBgMOTcyNTQ0NDAxMjQzFQIAEhggM0RFQTNCMEEwRTY3QzUwODYzMDc4NjQ4QzM4ODAxM0YA","timestamp":"1730231903","text":{"body":"Hey there! I am using PyWa."},"type":"text"}]},"field":"messages"}]}]}"#;

    #[test]
    fn decodes_seed_text_message() {
        let envelope: WebhookEnvelope = serde_json::from_str(SEED_BODY).unwrap();
        let decoded = decode_envelope(&envelope, None);
        assert_eq!(decoded.len(), 1);
        let update = decoded[0].update.as_ref().unwrap();
        assert!(matches!(update, Update::Message(_)));
        if let Update::Message(message) = update {
            assert_eq!(message.from.wa_id.as_str(), "972544401243");
            assert!(matches!(&message.payload, MessageType::Text(t) if t.body == "Hey there! I am using PyWa."));
        }
    }

    #[test]
    fn phone_id_filter_drops_mismatched_update() {
        let envelope: WebhookEnvelope = serde_json::from_str(SEED_BODY).unwrap();
        let other = PhoneId::new("000000000000000");
        let decoded = decode_envelope(&envelope, Some(&other));
        assert!(decoded[0].update.is_none());
        assert_eq!(decoded[0].field, "messages");
    }

    #[test]
    fn decoded_message_matches_every_field() {
        use pretty_assertions::assert_eq;

        let envelope: WebhookEnvelope = serde_json::from_str(SEED_BODY).unwrap();
        let decoded = decode_envelope(&envelope, None);
        let Some(Update::Message(message)) = decoded[0].update.clone() else {
            panic!("expected a decoded Message");
        };

        let expected = Message {
            id: MessageId::new("wamid.HBgMOTcyNTQ0NDAxMjQzFQIAEhggM0RFQTNCMEEwRTY3QzUwODYzMDc4NjQ4QzM4ODAxM0YA"),
            from: FromUser { wa_id: WaId::new("972544401243"), name: Some("PyWa Tests".to_string()) },
            recipient_phone_id: PhoneId::new("277321005464405"),
            recipient_display_phone: "15550953877".to_string(),
            timestamp: DateTime::from_timestamp(1_730_231_903, 0).unwrap(),
            context: None,
            tracker: None,
            payload: MessageType::Text(Text { body: "Hey there! I am using PyWa.".to_string() }),
        };

        assert_eq!(message, expected);
    }

    #[test]
    fn decodes_call_connect_event() {
        let body = r#"{"object":"whatsapp_business_account","entry":[{"id":"264937493375603","changes":[{"value":{"messaging_product":"whatsapp","metadata":{"display_phone_number":"15550953877","phone_number_id":"277321005464405"},"calls":[{"id":"wacid.abc","from":"972544401243","event":"connect","timestamp":"1730231903","direction":"USER_INITIATED","session":{"sdp_type":"offer","sdp":"v=0..."}}]},"field":"calls"}]}]}"#;
        let envelope: WebhookEnvelope = serde_json::from_str(body).unwrap();
        let decoded = decode_envelope(&envelope, None);
        let update = decoded[0].update.as_ref().unwrap();
        let Update::CallEvent(event) = update else { panic!("expected a CallEvent") };
        assert_eq!(event.call_id.as_str(), "wacid.abc");
        assert_eq!(event.from.as_str(), "972544401243");
        assert_eq!(event.direction, whatsapp_core::update::CallDirection::Business);
    }

    #[test]
    fn decodes_call_status_event() {
        let body = r#"{"object":"whatsapp_business_account","entry":[{"id":"264937493375603","changes":[{"value":{"messaging_product":"whatsapp","metadata":{"display_phone_number":"15550953877","phone_number_id":"277321005464405"},"calls":[{"id":"wacid.abc","from":"972544401243","event":"terminate","timestamp":"1730231903"}]},"field":"calls"}]}]}"#;
        let envelope: WebhookEnvelope = serde_json::from_str(body).unwrap();
        let decoded = decode_envelope(&envelope, None);
        let update = decoded[0].update.as_ref().unwrap();
        let Update::CallStatus(status) = update else { panic!("expected a CallStatus") };
        assert_eq!(status.call_id.as_str(), "wacid.abc");
        assert_eq!(status.status, "terminate");
    }

    #[test]
    fn decodes_user_preferences_update() {
        let body = r#"{"object":"whatsapp_business_account","entry":[{"id":"264937493375603","changes":[{"value":{"user_preferences":[{"wa_id":"972544401243","category":"marketing_messages","value":"stop"}]},"field":"user_preferences"}]}]}"#;
        let envelope: WebhookEnvelope = serde_json::from_str(body).unwrap();
        let decoded = decode_envelope(&envelope, None);
        let update = decoded[0].update.as_ref().unwrap();
        let Update::UserPreferencesUpdate(pref) = update else { panic!("expected a UserPreferencesUpdate") };
        assert_eq!(pref.wa_id.as_str(), "972544401243");
        assert_eq!(pref.category, "marketing_messages");
        assert_eq!(pref.value, "stop");
    }
}
