//! Inbound message payload types.
//!
//! Grounded on the webhook wire structs in the teacher's WhatsApp channel
//! adapter, generalized to the full set of message subtypes the Cloud API
//! sends rather than the handful the adapter normalized into a generic
//! `Message`.

use crate::ids::{MediaId, MessageId, WaId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The sender of an inbound message, as described by the webhook's `contacts[]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FromUser {
    /// The sender's WhatsApp ID.
    pub wa_id: WaId,
    /// The sender's profile display name, when the provider includes it.
    pub name: Option<String>,
}

/// A reference to the message being replied to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContext {
    /// The ID of the message this one replies to.
    pub id: MessageId,
    /// The `wa_id` of the sender of the original message.
    pub from: Option<WaId>,
    /// Whether the message was forwarded.
    #[serde(default)]
    pub forwarded: bool,
    /// Whether the message was forwarded many times (frequently-forwarded label).
    #[serde(default)]
    pub frequently_forwarded: bool,
}

/// Kind of media payload attached to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Image attachment.
    Image,
    /// Video attachment.
    Video,
    /// Voice note or audio clip.
    Audio,
    /// Arbitrary document/file.
    Document,
    /// Sticker (static or animated).
    Sticker,
}

/// A media attachment as it appears on an inbound message.
///
/// The `id` is only valid for 30 days and must be resolved to a signed URL
/// before download; see the Graph façade's media-download operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    /// Media kind.
    #[serde(skip)]
    pub kind: MediaKind,
    /// Uploaded media ID.
    pub id: MediaId,
    /// MIME type as reported by the provider.
    pub mime_type: String,
    /// SHA-256 of the media, hex-encoded.
    pub sha256: Option<String>,
    /// Caption text, if any (images/videos/documents only).
    pub caption: Option<String>,
    /// Original file name (documents only).
    pub filename: Option<String>,
    /// Whether this is a voice note rather than a regular audio clip.
    #[serde(default)]
    pub voice: bool,
    /// Short animated-sticker flag.
    #[serde(default)]
    pub animated: bool,
}

/// A geographic location shared by the user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

/// A contacts card shared by the user. Kept intentionally loose: the wire
/// shape has many optional nested arrays (phones, emails, addresses, org)
/// that downstream code rarely needs typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Raw contact card payload, as sent by the provider.
    #[serde(flatten)]
    pub raw: serde_json::Value,
}

/// An order placed through a catalog message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Catalog ID the order references.
    pub catalog_id: String,
    /// Free-text note attached to the order.
    pub text: Option<String>,
    /// Ordered product items.
    pub product_items: Vec<OrderItem>,
}

/// A single line item within an [`Order`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Catalog product retailer ID.
    pub product_retailer_id: String,
    /// Quantity ordered.
    pub quantity: u32,
    /// Item price, in the smallest currency unit.
    pub item_price: f64,
    /// ISO currency code.
    pub currency: String,
}

/// The decoded payload of an inbound text message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    /// Message body.
    pub body: String,
}

/// A reaction to a previously sent message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    /// ID of the message being reacted to.
    pub message_id: MessageId,
    /// Emoji used, or empty string when the reaction was removed.
    pub emoji: String,
}

/// A reported error attached to an otherwise-unprocessable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageError {
    /// Numeric error code.
    pub code: i64,
    /// Human-readable title.
    pub title: String,
    /// Additional detail, when the provider supplies one.
    pub message: Option<String>,
}

/// System-level event embedded in a `type: "system"` message (phone number
/// change, identity change).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemEvent {
    /// System event subtype, verbatim from the provider (`customer_changed_number`, etc).
    #[serde(rename = "type")]
    pub kind: String,
    /// Free-text body describing the change.
    pub body: Option<String>,
    /// The new `wa_id`, for number-change events.
    pub wa_id: Option<WaId>,
    /// The customer's prior `wa_id`, for number-change events.
    pub customer: Option<WaId>,
}

/// The payload variant of an inbound [`Message`].
///
/// Exactly one variant is populated per message; see invariant I-1 in the
/// testable-properties section: `has_media() ⇔ variant is media-bearing`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum MessageType {
    /// Plain text.
    Text(Text),
    /// Image, with optional caption.
    Image(Media),
    /// Video, with optional caption.
    Video(Media),
    /// Voice note or audio clip.
    Audio(Media),
    /// Document, with optional caption and filename.
    Document(Media),
    /// Sticker.
    Sticker(Media),
    /// Shared location.
    Location(Location),
    /// Shared contact cards.
    Contacts(Vec<Contact>),
    /// Emoji reaction to another message.
    Reaction(Reaction),
    /// Catalog order.
    Order(Order),
    /// System event (phone number / identity change).
    System(SystemEvent),
    /// A message type the provider sent but this decoder does not model yet.
    Unsupported(MessageError),
}

impl MessageType {
    /// True for every variant that carries a resolvable media attachment.
    #[must_use]
    pub const fn has_media(&self) -> bool {
        matches!(
            self,
            Self::Image(_) | Self::Video(_) | Self::Audio(_) | Self::Document(_) | Self::Sticker(_)
        )
    }

    /// Returns the attached [`Media`], if this variant carries one.
    #[must_use]
    pub const fn media(&self) -> Option<&Media> {
        match self {
            Self::Image(m) | Self::Video(m) | Self::Audio(m) | Self::Document(m) | Self::Sticker(m) => {
                Some(m)
            }
            _ => None,
        }
    }
}

/// A single inbound message, decoded from a webhook `messages[]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Provider-assigned message ID.
    pub id: MessageId,
    /// Sender.
    pub from: FromUser,
    /// `phone_number_id` that received the message.
    pub recipient_phone_id: crate::ids::PhoneId,
    /// Display phone number of the recipient (human-readable).
    pub recipient_display_phone: String,
    /// Message timestamp (seconds-precision UTC, as the provider sends it).
    pub timestamp: DateTime<Utc>,
    /// Reply context, if this message replies to another.
    pub context: Option<MessageContext>,
    /// `biz_opaque_callback_data`, when the provider echoes one back.
    pub tracker: Option<String>,
    /// The message payload.
    pub payload: MessageType,
}

impl Message {
    /// Shorthand for `self.payload.has_media()`.
    #[must_use]
    pub const fn has_media(&self) -> bool {
        self.payload.has_media()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(payload: MessageType) -> Message {
        Message {
            id: MessageId::new("wamid.abc"),
            from: FromUser {
                wa_id: WaId::new("972544401243"),
                name: Some("PyWa Tests".into()),
            },
            recipient_phone_id: crate::ids::PhoneId::new("277321005464405"),
            recipient_display_phone: "15550953877".into(),
            timestamp: DateTime::from_timestamp(1_730_231_903, 0).unwrap(),
            context: None,
            tracker: None,
            payload,
        }
    }

    #[test]
    fn has_media_matches_payload_kind() {
        let text = sample(MessageType::Text(Text { body: "hi".into() }));
        assert!(!text.has_media());

        let image = sample(MessageType::Image(Media {
            kind: MediaKind::Image,
            id: MediaId::new("m1"),
            mime_type: "image/jpeg".into(),
            sha256: None,
            caption: None,
            filename: None,
            voice: false,
            animated: false,
        }));
        assert!(image.has_media());
    }

    #[test]
    fn unsupported_has_no_media() {
        let unsupported = sample(MessageType::Unsupported(MessageError {
            code: 131_051,
            title: "Unsupported message type".into(),
            message: None,
        }));
        assert!(!unsupported.has_media());
    }

    #[test]
    fn message_survives_a_json_round_trip() {
        use pretty_assertions::assert_eq;

        let original = sample(MessageType::Text(Text { body: "Hey there! I am using PyWa.".into() }));
        let json = serde_json::to_string(&original).unwrap();
        let restored: Message = serde_json::from_str(&json).unwrap();

        assert_eq!(original, restored);
    }
}
