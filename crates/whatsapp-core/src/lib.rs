//! # whatsapp-core
//!
//! Core data model, configuration, and validation for the WhatsApp Cloud API.
//!
//! This crate provides:
//! - Newtype identifiers (phone ID, `wa_id`, WABA ID, message/template/flow/call IDs)
//! - The inbound update taxonomy (messages, statuses, template events, calls, system events)
//! - Interactive and template wire types shared by the outbound builder and the decoder
//! - `CallbackData` encode/decode
//! - Client configuration
//! - Secrets handling (`ApiKey`)
//! - Boundary validation (header/body/footer/button length limits, etc.)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod callback;
pub mod config;
pub mod ids;
pub mod interactive;
pub mod message;
pub mod secrets;
pub mod template;
pub mod update;
pub mod validation;

pub use callback::{CallbackData, CallbackDataError};
pub use config::{ClientConfig, ClientConfigBuilder, ConfigError};
pub use ids::{CallId, FlowId, MessageId, PhoneId, TemplateId, WabaId, WaId};
pub use message::{Media, MediaKind, Message, MessageContext, MessageType};
pub use secrets::ApiKey;
pub use update::Update;
pub use validation::ValidationError;

/// Re-exports of the commonly used types, mirroring the crate's public surface.
pub mod prelude {
    pub use crate::callback::CallbackData;
    pub use crate::config::ClientConfig;
    pub use crate::ids::{CallId, FlowId, MessageId, PhoneId, TemplateId, WabaId, WaId};
    pub use crate::interactive::*;
    pub use crate::message::*;
    pub use crate::secrets::ApiKey;
    pub use crate::template::*;
    pub use crate::update::Update;
}
