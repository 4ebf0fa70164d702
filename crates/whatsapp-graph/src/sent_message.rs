//! The value returned by a successful send.

use whatsapp_core::ids::{MessageId, PhoneId, WaId};

/// A successfully sent message.
///
/// Carries enough to build the "swapped" listener identifier
/// (`sender = to_user`, `recipient = from_phone_id`) used by the
/// `wait_for_*` shortcuts on the client facade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    id: MessageId,
    from_phone_id: PhoneId,
    to_user: WaId,
}

impl SentMessage {
    pub(crate) const fn new(id: MessageId, from_phone_id: PhoneId, to_user: WaId) -> Self {
        Self { id, from_phone_id, to_user }
    }

    /// The provider-assigned ID of the sent message.
    #[must_use]
    pub const fn id(&self) -> &MessageId {
        &self.id
    }

    /// The phone ID the message was sent from.
    #[must_use]
    pub const fn from_phone_id(&self) -> &PhoneId {
        &self.from_phone_id
    }

    /// The recipient's `wa_id`.
    #[must_use]
    pub const fn to_user(&self) -> &WaId {
        &self.to_user
    }
}

/// A successfully sent template, additionally carrying the template name
/// that was rendered (for correlating with `message_template_status_update` events).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentTemplate {
    message: SentMessage,
    template_name: String,
}

impl SentTemplate {
    pub(crate) const fn new(message: SentMessage, template_name: String) -> Self {
        Self { message, template_name }
    }

    /// The underlying sent-message value.
    #[must_use]
    pub const fn message(&self) -> &SentMessage {
        &self.message
    }

    /// The name of the template that was rendered.
    #[must_use]
    pub fn template_name(&self) -> &str {
        &self.template_name
    }
}
