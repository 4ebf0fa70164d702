//! # whatsapp-client
//!
//! The unified WhatsApp Cloud API client: outbound sends and Graph
//! management calls, inbound webhook dispatch, Flow endpoint processing,
//! and `wait_for_*`/`wait_until_*` listener shortcuts, behind one cheaply
//! cloneable [`WhatsApp`] handle built through [`WhatsAppBuilder`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// The facade's aggregated error type.
pub mod error;
/// Builds a [`WhatsApp`] client from configuration, handlers, and Flow endpoints.
pub mod builder;
/// The [`WhatsApp`] handle and its Graph/webhook delegating methods.
pub mod client;
/// `wait_for_*`/`wait_until_*` listener shortcuts.
pub mod listen;

pub use builder::WhatsAppBuilder;
pub use client::WhatsApp;
pub use error::{ClientError, ListenError};

// Re-exports of the commonly used types from the underlying crates, so most
// applications need only depend on this one crate.
pub use whatsapp_core::prelude::*;
pub use whatsapp_flows::{EncryptedMediaReference, FlowCallback, FlowEndpointConfig, FlowError, FlowProcessor, FlowRequest, FlowResponse};
pub use whatsapp_graph::calls::CallSession;
pub use whatsapp_graph::media::{MediaRef, MediaUrlInfo};
pub use whatsapp_graph::send::{MediaKind as OutboundMediaKind, SendEndpoint, SendOptions};
pub use whatsapp_graph::sent_message::{SentMessage, SentTemplate};
pub use whatsapp_graph::GraphError;
pub use whatsapp_webhook::WebhookError;
