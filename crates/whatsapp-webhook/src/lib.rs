//! # WhatsApp Webhook
//!
//! Inbound webhook ingress for the WhatsApp Cloud API: signature
//! verification, polymorphic update decoding, ordered handler dispatch, a
//! listener coordinator for request/response style flows, and a bounded
//! dedupe set guarding against the provider's at-least-once delivery.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Decodes a wire-format webhook envelope into typed updates.
pub mod decoder;
/// Bounded in-memory dedupe set for inbound deliveries.
pub mod dedupe;
/// Loose wire DTOs mirroring the provider's webhook JSON shape.
pub mod envelope;
/// Webhook pipeline error taxonomy.
pub mod error;
/// Tracks at most one active listener per counterparty/template.
pub mod listener;
/// Ties the decoder, handler registry, listener coordinator, and dedupe set together.
pub mod pipeline;
/// Handler registry: binds update kinds to ordered callback chains.
pub mod registry;
/// Axum router binding the webhook pipeline's two entry points.
pub mod server;

pub use decoder::{decode_envelope, DecodedUpdate};
pub use dedupe::{body_hash, DedupeSet};
pub use error::WebhookError;
pub use listener::{ListenerCoordinator, ListenerIdentifier, ListenerOutcome, Resolution};
pub use pipeline::{bootstrap_subscription, WebhookConfig, WebhookPipeline};
pub use registry::{
    callback_string, Callback, Filter, Handler, HandlerRegistry, HandlerSignal, RawCallback, UpdateKind,
};
pub use server::router;
