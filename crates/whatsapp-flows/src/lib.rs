//! # WhatsApp Flows
//!
//! Server-side processing for WhatsApp Flow endpoints: decrypting inbound
//! requests, answering health checks and client-reported errors without
//! invoking application code, dispatching to a registered callback, and
//! encrypting the response. Also exposes lazy decryption of encrypted media
//! attachments embedded in a Flow's `data_exchange` payload.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Flow endpoint error taxonomy.
pub mod error;
/// Flow request/response payload types.
pub mod types;
/// The Flow endpoint processor: decrypt, route, encrypt.
pub mod processor;

pub use error::FlowError;
pub use processor::{BoxFuture, FlowCallback, FlowEndpointConfig, FlowProcessor};
pub use types::{EncryptedMediaReference, FlowRequest, FlowResponse};
