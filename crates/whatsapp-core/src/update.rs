//! The inbound update taxonomy: the single typed enum every decoded webhook
//! update collapses into before it reaches the handler registry or the
//! listener coordinator.

use crate::ids::{CallId, FlowId, MessageId, PhoneId, TemplateId, WaId};
use crate::interactive::{CallbackButton, CallbackSelection, FlowCompletion};
use crate::message::Message;
use crate::template::{TemplateCategory, TemplateQuality, TemplateStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Delivery status of a previously sent outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// Accepted by the provider for delivery.
    Sent,
    /// Delivered to the recipient's device.
    Delivered,
    /// Read by the recipient (blue ticks).
    Read,
    /// Delivery failed; see `errors`.
    Failed,
    /// Deleted by the recipient before being read.
    Deleted,
    /// A warning was raised but the message is still deliverable.
    Warning,
}

/// A provider-reported delivery error attached to a [`MessageStatus`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryError {
    /// Numeric error code.
    pub code: i64,
    /// Error title.
    pub title: String,
    /// Additional detail, when supplied.
    pub message: Option<String>,
    /// Structured error detail blob, when supplied.
    pub error_data: Option<serde_json::Value>,
}

/// Per-conversation and per-pricing metadata attached to some status updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationInfo {
    /// Opaque conversation ID assigned by the provider.
    pub id: String,
    /// Conversation category (e.g. `service`, `marketing`).
    pub category: Option<String>,
    /// Expiry of the free-form messaging window, when applicable.
    pub expiration: Option<DateTime<Utc>>,
}

/// Delivery-status update for a previously sent message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageStatus {
    /// ID of the message this status refers to.
    pub message_id: MessageId,
    /// Recipient this status concerns.
    pub recipient: WaId,
    /// `phone_number_id` that sent the original message.
    pub sender_phone_id: PhoneId,
    /// The new delivery status.
    pub status: DeliveryStatus,
    /// When the status was recorded.
    pub timestamp: DateTime<Utc>,
    /// Delivery errors, present only for `status == Failed`.
    pub errors: Vec<DeliveryError>,
    /// Conversation/pricing metadata, present for billable statuses.
    pub conversation: Option<ConversationInfo>,
    /// `biz_opaque_callback_data` echoed back from the original send.
    pub tracker: Option<String>,
}

/// A template's approval status changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateStatusUpdate {
    /// Template ID.
    pub template_id: TemplateId,
    /// Template name.
    pub template_name: String,
    /// BCP-47 language code.
    pub template_language: String,
    /// New status.
    pub status: TemplateStatus,
    /// Rejection/disable reason, when applicable.
    pub reason: Option<String>,
}

/// A template's quality score changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateQualityUpdate {
    /// Template ID.
    pub template_id: TemplateId,
    /// Template name.
    pub template_name: String,
    /// New quality score.
    pub new_quality: TemplateQuality,
    /// Previous quality score.
    pub previous_quality: TemplateQuality,
}

/// A template's category was reclassified (e.g. marketing → utility).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateCategoryUpdate {
    /// Template ID.
    pub template_id: TemplateId,
    /// Template name.
    pub template_name: String,
    /// New category.
    pub new_category: TemplateCategory,
    /// Previous category.
    pub previous_category: TemplateCategory,
}

/// The user opened the chat ("request welcome message") after the 24h window closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatOpened {
    /// The user who opened the chat.
    pub from: WaId,
    /// `phone_number_id` that received the event.
    pub recipient_phone_id: PhoneId,
    /// Event timestamp.
    pub timestamp: DateTime<Utc>,
}

/// The customer changed their phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumberChange {
    /// The customer's new `wa_id`.
    pub new_wa_id: WaId,
    /// The customer's previous `wa_id`.
    pub old_wa_id: WaId,
}

/// A contact's security/identity information changed (e.g. re-registered on a new device).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityChange {
    /// The contact whose identity changed.
    pub wa_id: WaId,
    /// Free-text description of the change.
    pub body: Option<String>,
}

/// Direction of a [`CallEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallDirection {
    /// The business is receiving a call.
    Business,
    /// The user is receiving a call.
    User,
}

/// An inbound or outbound WhatsApp Business Calling event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallEvent {
    /// Call ID.
    pub call_id: CallId,
    /// The other party on the call.
    pub from: WaId,
    /// `phone_number_id` this call concerns.
    pub phone_id: PhoneId,
    /// Call direction.
    pub direction: CallDirection,
    /// SDP session description, when the event carries one.
    pub session: Option<serde_json::Value>,
}

/// A call's status changed (ringing, connected, ended).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallStatus {
    /// Call ID.
    pub call_id: CallId,
    /// New status, verbatim from the provider.
    pub status: String,
    /// Timestamp of the status change.
    pub timestamp: DateTime<Utc>,
}

/// The user changed a messaging preference (e.g. opted out of marketing messages).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferencesUpdate {
    /// The user whose preference changed.
    pub wa_id: WaId,
    /// Preference category, verbatim from the provider.
    pub category: String,
    /// New value, verbatim from the provider.
    pub value: String,
}

/// The fully decoded form of a single webhook update: exactly one variant
/// per `entry[].changes[]` element, per the decoding algorithm in the
/// design notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "update_kind")]
pub enum Update {
    /// A plain inbound message (or any subtype not covered by a more specific variant).
    Message(Message),
    /// A reply-button tap.
    CallbackButton(CallbackButton),
    /// A list-row selection.
    CallbackSelection(CallbackSelection),
    /// A completed Flow exchange.
    FlowCompletion(FlowCompletion),
    /// A delivery-status change for a previously sent message.
    MessageStatus(MessageStatus),
    /// A template's approval status changed.
    TemplateStatusUpdate(TemplateStatusUpdate),
    /// A template's quality score changed.
    TemplateQualityUpdate(TemplateQualityUpdate),
    /// A template's category changed.
    TemplateCategoryUpdate(TemplateCategoryUpdate),
    /// The user requested a welcome message.
    ChatOpened(ChatOpened),
    /// The customer's phone number changed.
    PhoneNumberChange(PhoneNumberChange),
    /// The customer's identity changed.
    IdentityChange(IdentityChange),
    /// An inbound/outbound call event.
    CallEvent(CallEvent),
    /// A call's status changed.
    CallStatus(CallStatus),
    /// A user messaging preference changed.
    UserPreferencesUpdate(UserPreferencesUpdate),
}

impl Update {
    /// The `wa_id` this update concerns, for updates the listener coordinator can key on.
    #[must_use]
    pub fn counterparty(&self) -> Option<&WaId> {
        match self {
            Self::Message(m) => Some(&m.from.wa_id),
            Self::CallbackButton(b) => Some(&b.from),
            Self::CallbackSelection(s) => Some(&s.from),
            Self::FlowCompletion(f) => Some(&f.from),
            Self::MessageStatus(s) => Some(&s.recipient),
            Self::ChatOpened(c) => Some(&c.from),
            Self::PhoneNumberChange(p) => Some(&p.new_wa_id),
            Self::IdentityChange(i) => Some(&i.wa_id),
            Self::CallEvent(c) => Some(&c.from),
            Self::UserPreferencesUpdate(u) => Some(&u.wa_id),
            Self::TemplateStatusUpdate(_)
            | Self::TemplateQualityUpdate(_)
            | Self::TemplateCategoryUpdate(_)
            | Self::CallStatus(_) => None,
        }
    }

    /// The template ID this update concerns, when it is template-scoped.
    #[must_use]
    pub const fn template_id(&self) -> Option<&TemplateId> {
        match self {
            Self::TemplateStatusUpdate(t) => Some(&t.template_id),
            Self::TemplateQualityUpdate(t) => Some(&t.template_id),
            Self::TemplateCategoryUpdate(t) => Some(&t.template_id),
            _ => None,
        }
    }

    /// The flow ID this update concerns, when it names one.
    #[must_use]
    pub fn flow_id(&self) -> Option<FlowId> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::MessageId;

    #[test]
    fn counterparty_is_populated_for_message_status() {
        let status = MessageStatus {
            message_id: MessageId::new("wamid.1"),
            recipient: WaId::new("972544401243"),
            sender_phone_id: PhoneId::new("277321005464405"),
            status: DeliveryStatus::Delivered,
            timestamp: DateTime::from_timestamp(1_730_231_903, 0).unwrap(),
            errors: vec![],
            conversation: None,
            tracker: None,
        };
        let update = Update::MessageStatus(status);
        assert_eq!(update.counterparty().unwrap().as_str(), "972544401243");
    }

    #[test]
    fn template_updates_have_no_counterparty() {
        let update = Update::TemplateStatusUpdate(TemplateStatusUpdate {
            template_id: TemplateId::new("123"),
            template_name: "hello".into(),
            template_language: "en_US".into(),
            status: TemplateStatus::Approved,
            reason: None,
        });
        assert!(update.counterparty().is_none());
        assert_eq!(update.template_id().unwrap().as_str(), "123");
    }
}
