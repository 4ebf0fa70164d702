//! Message template declarations and the send-time parameters that fill them.

use crate::ids::{FlowId, TemplateId};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

/// Approval status of a template, as tracked by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemplateStatus {
    /// Approved and sendable.
    Approved,
    /// Disabled, usually after repeated quality drops.
    Disabled,
    /// Under appeal after rejection.
    InAppeal,
    /// Awaiting review.
    Pending,
    /// Reinstated after a prior disable.
    Reinstated,
    /// Rejected during review.
    Rejected,
    /// Deleted by the business.
    Deleted,
    /// Scheduled for deletion.
    PendingDeletion,
    /// Flagged for a potential policy violation.
    Flagged,
    /// Paused for sending, pending a quality review.
    Paused,
    /// Sending limit exceeded for the category.
    LimitExceeded,
    /// Archived (not sendable, kept for audit).
    Archived,
    /// Locked: edits disallowed until an ongoing review finishes.
    Locked,
}

/// Recent delivery-quality signal for a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TemplateQuality {
    /// High quality.
    Green,
    /// Medium quality.
    Yellow,
    /// Low quality.
    Red,
    /// Not enough delivery volume to score.
    Unknown,
}

/// The template category, governing which rate-limit bucket it draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemplateCategory {
    /// Authentication (OTP) template.
    Authentication,
    /// Marketing template.
    Marketing,
    /// Utility/transactional template.
    Utility,
}

/// A header component declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "UPPERCASE")]
pub enum HeaderDeclaration {
    /// Plain text header, optionally with one named/positional variable.
    Text {
        /// Header text, e.g. `"Hello {{1}}"`.
        text: String,
    },
    /// Image header; `example` is a resumable-upload handle.
    Image {
        /// Upload handle for the example media.
        example: Option<String>,
    },
    /// Video header.
    Video {
        /// Upload handle for the example media.
        example: Option<String>,
    },
    /// Animated-GIF header.
    Document {
        /// Upload handle for the example media.
        example: Option<String>,
    },
    /// Location header (address resolved at send time).
    Location,
}

/// The required body component declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyDeclaration {
    /// Body text, with `{{1}}`/`{{name}}`-style placeholders.
    pub text: String,
    /// Example values for each placeholder, keyed by placeholder name.
    #[serde(default)]
    pub examples: Vec<String>,
}

/// The optional footer component declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FooterDeclaration {
    /// Footer text (no variables permitted).
    pub text: String,
}

/// One-Time-Password template flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OtpButtonKind {
    /// User copies the code manually.
    CopyCode,
    /// A single tap launches the app with the code.
    OneTap,
    /// A tap with no user confirmation (zero-tap, requires provider approval).
    ZeroTap,
}

/// A single button declaration within a template's buttons component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ButtonDeclaration {
    /// Quick-reply button; tapping it delivers a `button`-type message.
    QuickReply {
        /// Button label.
        text: String,
    },
    /// Opens a URL, optionally with one trailing `{{1}}` variable.
    Url {
        /// Button label.
        text: String,
        /// Destination URL template.
        url: String,
        /// Example value for the URL's trailing variable, if any.
        example: Option<Vec<String>>,
    },
    /// Dials a phone number.
    PhoneNumber {
        /// Button label.
        text: String,
        /// E.164 phone number.
        phone_number: String,
    },
    /// Initiates a WhatsApp voice call.
    VoiceCall {
        /// Button label.
        text: String,
    },
    /// Copies a fixed code to the clipboard.
    CopyCode {
        /// Example code value.
        example: String,
    },
    /// Opens a Flow.
    Flow {
        /// Button label.
        text: String,
        /// The flow this button launches.
        flow_id: FlowId,
        /// Name of the action the flow should start with.
        flow_action: Option<String>,
    },
    /// One-Time-Password button (authentication category only).
    Otp {
        /// OTP delivery mechanism.
        otp_type: OtpButtonKind,
        /// Button label (ignored for zero-tap/one-tap, required for copy-code).
        text: Option<String>,
    },
    /// Opens the single-product message picker.
    Mpm {
        /// Button label.
        text: String,
    },
    /// Opens a catalog.
    Catalog {
        /// Button label.
        text: String,
    },
}

/// A template's buttons component declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonsDeclaration {
    /// Buttons, in display order.
    pub buttons: Vec<ButtonDeclaration>,
}

/// A full template declaration as stored by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDeclaration {
    /// Template ID, once created.
    pub id: Option<TemplateId>,
    /// Template name (unique per WABA + language).
    pub name: String,
    /// BCP-47 language code.
    pub language: String,
    /// Rate-limit category.
    pub category: TemplateCategory,
    /// Optional header component.
    pub header: Option<HeaderDeclaration>,
    /// Required body component.
    pub body: BodyDeclaration,
    /// Optional footer component.
    pub footer: Option<FooterDeclaration>,
    /// Optional buttons component.
    pub buttons: Option<ButtonsDeclaration>,
    /// Current approval status, once submitted.
    pub status: Option<TemplateStatus>,
    /// Current quality score, once the provider has enough volume to score it.
    pub quality: Option<TemplateQuality>,
    /// Rejection detail, if `status == Rejected`.
    pub rejection_reason: Option<String>,
}

/// A bulk authentication-template declaration, covering several languages at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthTemplateDeclaration {
    /// Template name, shared across every language variant.
    pub name: String,
    /// Languages to create the template for.
    pub languages: Vec<String>,
    /// Whether the OTP button is copy-code (`true`) or one-tap/zero-tap.
    pub code_expiration_minutes: Option<u32>,
    /// Buttons component, usually a single OTP button.
    pub buttons: ButtonsDeclaration,
}

// --- send-time parameters -------------------------------------------------

/// A named or positional template variable value, filled in at send time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// A plain text substitution.
    Text(String),
    /// A currency amount, rendered per the recipient's locale.
    Currency {
        /// ISO 4217 currency code.
        code: String,
        /// Amount in the smallest currency unit (e.g. cents).
        amount_1000: i64,
        /// Fallback rendered value.
        fallback_value: String,
    },
    /// A date/time value, rendered per the recipient's locale.
    DateTime {
        /// Fallback rendered value.
        fallback_value: String,
    },
}

/// Send-time parameters for one component of a template send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ComponentParams {
    /// Header parameter(s).
    Header {
        /// Parameter values, in declared placeholder order.
        parameters: Vec<ParamValue>,
    },
    /// Body parameter(s).
    Body {
        /// Parameter values, in declared placeholder order.
        parameters: Vec<ParamValue>,
    },
    /// Button parameter(s), addressed by `sub_type` and zero-based `index`.
    Button {
        /// Button subtype (`quick_reply`, `url`, `copy_code`, etc).
        sub_type: String,
        /// Zero-based index into the template's buttons array.
        index: u32,
        /// Parameter values for this button.
        parameters: Vec<ParamValue>,
    },
}

/// The full set of parameters needed to send a named template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateParams {
    /// Template name.
    pub name: String,
    /// BCP-47 language code to render.
    pub language: String,
    /// Per-component parameter sets.
    pub components: Vec<ComponentParams>,
}

/// Numeric status codes used by `message_template_status_update` webhook events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum TemplateEventCode {
    /// Approved.
    Approved = 0,
    /// Rejected.
    Rejected = 1,
    /// Disabled.
    Disabled = 2,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_declaration_tags_by_type() {
        let json = serde_json::json!({
            "type": "QUICK_REPLY",
            "text": "Yes"
        });
        let decl: ButtonDeclaration = serde_json::from_value(json).unwrap();
        assert!(matches!(decl, ButtonDeclaration::QuickReply { text } if text == "Yes"));
    }

    #[test]
    fn param_value_is_untagged() {
        let text: ParamValue = serde_json::from_value(serde_json::json!("hi")).unwrap();
        assert_eq!(text, ParamValue::Text("hi".into()));
    }
}
