//! Wire DTOs for the webhook POST body.
//!
//! These mirror the provider's JSON shape closely and are intentionally
//! looser than the [`whatsapp_core`] update types — [`crate::decoder`]
//! narrows them into the closed [`whatsapp_core::update::Update`] union.

use serde::Deserialize;

/// The top-level webhook envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEnvelope {
    /// Always `"whatsapp_business_account"` for this webhook.
    pub object: String,
    /// One entry per subscribed WABA; providers currently send one.
    pub entry: Vec<WireEntry>,
}

/// One entry in the envelope, scoped to a WABA.
#[derive(Debug, Clone, Deserialize)]
pub struct WireEntry {
    /// WABA ID.
    pub id: String,
    /// One change per entry; providers currently send one.
    pub changes: Vec<WireChange>,
}

/// One change within an entry.
#[derive(Debug, Clone, Deserialize)]
pub struct WireChange {
    /// The change payload, shape depends on `field`.
    pub value: serde_json::Value,
    /// Which subscribed field this change belongs to
    /// (`"messages"`, `"message_template_status_update"`, …).
    pub field: String,
}

/// The `value` shape when `field == "messages"`.
#[derive(Debug, Clone, Deserialize)]
pub struct MessagesValue {
    /// Always `"whatsapp"`.
    #[serde(default)]
    pub messaging_product: Option<String>,
    /// Recipient-side metadata.
    pub metadata: Option<WireMetadata>,
    /// Sender contact info, present on inbound messages, absent on statuses.
    #[serde(default)]
    pub contacts: Vec<WireContact>,
    /// Inbound messages.
    #[serde(default)]
    pub messages: Vec<WireMessage>,
    /// Outbound delivery/read status updates.
    #[serde(default)]
    pub statuses: Vec<WireStatus>,
}

/// Recipient-side metadata on a `messages` value.
#[derive(Debug, Clone, Deserialize)]
pub struct WireMetadata {
    /// Human-readable phone number.
    pub display_phone_number: Option<String>,
    /// Phone-number ID that received/sent the message.
    pub phone_number_id: Option<String>,
}

/// One `contacts[]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct WireContact {
    /// Profile info.
    pub profile: Option<WireProfile>,
    /// The contact's `wa_id`.
    pub wa_id: String,
}

/// A contact's profile.
#[derive(Debug, Clone, Deserialize)]
pub struct WireProfile {
    /// Display name.
    pub name: Option<String>,
}

/// One inbound `messages[]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct WireMessage {
    /// Message ID.
    pub id: String,
    /// Sender's `wa_id`.
    pub from: String,
    /// Unix-epoch-seconds timestamp, as a string.
    pub timestamp: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub kind: String,
    /// Reply context.
    pub context: Option<WireContext>,
    /// `biz_opaque_callback_data`, echoed back from the original send.
    pub biz_opaque_callback_data: Option<String>,
    /// Text payload.
    pub text: Option<WireText>,
    /// Image payload.
    pub image: Option<WireMedia>,
    /// Video payload.
    pub video: Option<WireMedia>,
    /// Audio payload.
    pub audio: Option<WireAudio>,
    /// Document payload.
    pub document: Option<WireDocument>,
    /// Sticker payload.
    pub sticker: Option<WireSticker>,
    /// Location payload.
    pub location: Option<WireLocation>,
    /// Shared contact cards.
    pub contacts: Option<Vec<serde_json::Value>>,
    /// Catalog order payload.
    pub order: Option<WireOrder>,
    /// System event payload (`type == "system"`).
    pub system: Option<WireSystem>,
    /// Reaction payload (`type == "reaction"`).
    pub reaction: Option<WireReaction>,
    /// Non-interactive quick-reply payload (`type == "button"`).
    pub button: Option<WireButton>,
    /// Interactive reply payload (`type == "interactive"`).
    pub interactive: Option<WireInteractiveReply>,
    /// Errors attached when the message itself could not be processed.
    pub errors: Option<Vec<WireError>>,
}

/// Text message body.
#[derive(Debug, Clone, Deserialize)]
pub struct WireText {
    /// Message text.
    pub body: String,
}

/// Image/video media reference.
#[derive(Debug, Clone, Deserialize)]
pub struct WireMedia {
    /// Media ID (30-day handle).
    pub id: String,
    /// MIME type.
    pub mime_type: String,
    /// Hex SHA-256, when provided.
    pub sha256: Option<String>,
    /// Caption, when provided.
    pub caption: Option<String>,
}

/// Audio media reference.
#[derive(Debug, Clone, Deserialize)]
pub struct WireAudio {
    /// Media ID.
    pub id: String,
    /// MIME type.
    pub mime_type: String,
    /// Whether this is a voice note.
    pub voice: Option<bool>,
}

/// Document media reference.
#[derive(Debug, Clone, Deserialize)]
pub struct WireDocument {
    /// Media ID.
    pub id: String,
    /// MIME type.
    pub mime_type: String,
    /// Caption, when provided.
    pub caption: Option<String>,
    /// Original file name.
    pub filename: Option<String>,
}

/// Sticker media reference.
#[derive(Debug, Clone, Deserialize)]
pub struct WireSticker {
    /// Media ID.
    pub id: String,
    /// MIME type.
    pub mime_type: String,
    /// Whether the sticker is animated.
    pub animated: Option<bool>,
}

/// Location payload.
#[derive(Debug, Clone, Deserialize)]
pub struct WireLocation {
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
}

/// A reaction to a previously sent message.
#[derive(Debug, Clone, Deserialize)]
pub struct WireReaction {
    /// ID of the message being reacted to.
    pub message_id: String,
    /// Emoji used, or empty string when the reaction was removed.
    #[serde(default)]
    pub emoji: String,
}

/// Catalog order payload.
#[derive(Debug, Clone, Deserialize)]
pub struct WireOrder {
    /// Catalog ID.
    pub catalog_id: String,
    /// Free-text note.
    pub text: Option<String>,
    /// Line items.
    #[serde(default)]
    pub product_items: Vec<serde_json::Value>,
}

/// System event payload.
#[derive(Debug, Clone, Deserialize)]
pub struct WireSystem {
    /// Subtype (`"customer_changed_number"`, `"customer_identity_changed"`, …).
    #[serde(rename = "type")]
    pub kind: String,
    /// Free-text description.
    pub body: Option<String>,
    /// New `wa_id`, for number-change events.
    pub wa_id: Option<String>,
    /// Prior `wa_id`, for number-change events.
    pub customer: Option<String>,
}

/// Non-interactive quick-reply button payload.
#[derive(Debug, Clone, Deserialize)]
pub struct WireButton {
    /// Opaque payload attached to the button at template-send time.
    pub payload: String,
    /// Button label.
    pub text: String,
}

/// Interactive reply payload, shape depends on `interactive.type`.
#[derive(Debug, Clone, Deserialize)]
pub struct WireInteractiveReply {
    /// Which sub-shape is populated (`"button_reply"`, `"list_reply"`, `"nfm_reply"`).
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Populated when `kind == "button_reply"`.
    pub button_reply: Option<WireButtonReply>,
    /// Populated when `kind == "list_reply"`.
    pub list_reply: Option<WireListReply>,
    /// Populated when `kind == "nfm_reply"` (Flow completion).
    pub nfm_reply: Option<WireFlowReply>,
}

/// A tapped reply-button outcome.
#[derive(Debug, Clone, Deserialize)]
pub struct WireButtonReply {
    /// Callback data.
    pub id: String,
    /// Button title, echoed back.
    pub title: String,
}

/// A selected list-row outcome.
#[derive(Debug, Clone, Deserialize)]
pub struct WireListReply {
    /// Callback data.
    pub id: String,
    /// Row title, echoed back.
    pub title: String,
    /// Row description, echoed back.
    pub description: Option<String>,
}

/// A completed Flow exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct WireFlowReply {
    /// Response token, absent occasionally on iOS.
    pub flow_token: Option<String>,
    /// Final submitted data, JSON-encoded as a string by the provider.
    pub response_json: String,
}

/// Reply context (`context` on messages and statuses).
#[derive(Debug, Clone, Deserialize)]
pub struct WireContext {
    /// ID of the message being replied to.
    pub id: String,
    /// Sender of the original message.
    pub from: Option<String>,
    /// Whether the message was forwarded.
    #[serde(default)]
    pub forwarded: bool,
    /// Whether the message was forwarded frequently.
    #[serde(default)]
    pub frequently_forwarded: bool,
}

/// A message-level or status-level error.
#[derive(Debug, Clone, Deserialize)]
pub struct WireError {
    /// Numeric code.
    pub code: i64,
    /// Title.
    pub title: String,
    /// Additional detail.
    pub message: Option<String>,
}

/// One outbound delivery/read `statuses[]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct WireStatus {
    /// The sent message's ID.
    pub id: String,
    /// Recipient `wa_id`.
    pub recipient_id: String,
    /// `"sent"`, `"delivered"`, `"read"`, or `"failed"`.
    pub status: String,
    /// Unix-epoch-seconds timestamp, as a string.
    pub timestamp: String,
    /// Conversation billing info, when present.
    pub conversation: Option<WireConversation>,
    /// Errors at the status level.
    pub errors: Option<Vec<WireError>>,
    /// `biz_opaque_callback_data`, echoed back from the original send.
    pub biz_opaque_callback_data: Option<String>,
}

/// Conversation billing info attached to a status update.
#[derive(Debug, Clone, Deserialize)]
pub struct WireConversation {
    /// Conversation ID.
    pub id: String,
    /// Billing origin.
    pub origin: Option<WireConversationOrigin>,
    /// Expiration, unix-epoch-seconds as a string.
    pub expiration_timestamp: Option<String>,
}

/// Conversation billing origin.
#[derive(Debug, Clone, Deserialize)]
pub struct WireConversationOrigin {
    /// Origin type (`"business_initiated"`, `"user_initiated"`, `"referral_conversion"`).
    #[serde(rename = "type")]
    pub kind: String,
}

/// The `value` shape for `field == "message_template_status_update"`.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateStatusValue {
    /// Template ID.
    pub message_template_id: i64,
    /// Template name.
    pub message_template_name: String,
    /// Template language.
    pub message_template_language: String,
    /// New status, e.g. `"APPROVED"`, `"REJECTED"`, `"DISABLED"`.
    pub event: String,
    /// Rejection/disable reason, when applicable.
    pub reason: Option<String>,
}

/// The `value` shape for `field == "message_template_quality_update"`.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateQualityValue {
    /// Template ID.
    pub message_template_id: i64,
    /// Template name.
    pub message_template_name: String,
    /// Template language.
    pub message_template_language: String,
    /// New quality score (`"GREEN"`, `"YELLOW"`, `"RED"`).
    pub new_quality_score: String,
    /// Previous quality score.
    pub previous_quality_score: Option<String>,
}

/// The `value` shape for `field == "message_template_category_update"`.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateCategoryValue {
    /// Template ID.
    pub message_template_id: i64,
    /// Template name.
    pub message_template_name: String,
    /// Previous category.
    pub previous_category: String,
    /// New category.
    pub new_category: String,
}

/// The `value` shape for `field == "calls"`.
#[derive(Debug, Clone, Deserialize)]
pub struct CallsValue {
    /// Recipient-side metadata.
    pub metadata: Option<WireMetadata>,
    /// One or more call events/status changes; providers currently send one.
    #[serde(default)]
    pub calls: Vec<WireCall>,
}

/// One `calls[]` entry: either a call event (`event == "connect"`, carrying
/// an SDP session) or a status change for an existing call.
#[derive(Debug, Clone, Deserialize)]
pub struct WireCall {
    /// Call ID.
    pub id: String,
    /// The other party on the call.
    pub from: String,
    /// `"connect"`, `"terminate"`, or a status like `"RINGING"`/`"ACCEPTED"`.
    pub event: String,
    /// Unix-epoch-seconds timestamp, as a string.
    pub timestamp: String,
    /// `"BUSINESS_INITIATED"` or `"USER_INITIATED"`, present on `connect`.
    pub direction: Option<String>,
    /// SDP session, present on `connect`.
    pub session: Option<WireCallSession>,
}

/// SDP session carried by a call-connect event.
#[derive(Debug, Clone, Deserialize)]
pub struct WireCallSession {
    /// SDP type (`"offer"` or `"answer"`).
    pub sdp_type: String,
    /// The SDP body.
    pub sdp: String,
}

/// The `value` shape for `field == "user_preferences"`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserPreferencesValue {
    /// One or more preference changes; providers currently send one.
    #[serde(default)]
    pub user_preferences: Vec<WireUserPreference>,
}

/// One `user_preferences[]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct WireUserPreference {
    /// The user whose preference changed.
    pub wa_id: String,
    /// Preference category, verbatim from the provider (e.g. `"marketing_messages"`).
    pub category: String,
    /// New value, verbatim from the provider (e.g. `"stop"`/`"resume"`).
    pub value: String,
}
