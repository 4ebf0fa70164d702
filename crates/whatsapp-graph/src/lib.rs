//! A thin typed façade over the WhatsApp Cloud API's `graph.facebook.com` host.
//!
//! This crate never retries, never interprets business semantics, and never
//! maintains conversation state — it assembles requests and classifies
//! provider error responses. The webhook pipeline, listener coordinator, and
//! flow processor live in separate crates that sit on top of this one.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// WhatsApp Business Calling API.
pub mod calls;
mod client;
mod error;
/// Flow lifecycle management (create/publish/deprecate).
pub mod flows;
/// Media upload/download/delete.
pub mod media;
/// Outbound message assembly and send.
pub mod send;
/// The value returned by a successful send.
pub mod sent_message;
/// Webhook subscription and phone-number registration.
pub mod subscriptions;
/// Message template management.
pub mod templates;

pub use client::GraphClient;
pub use error::{GraphError, GraphErrorDetail, GraphErrorKind};
pub use media::MediaRef;
pub use send::{MediaKind, SendEndpoint, SendOptions};
pub use sent_message::{SentMessage, SentTemplate};
