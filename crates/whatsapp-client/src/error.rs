//! The facade's aggregated error type.

use std::time::Duration;
use thiserror::Error;

/// Why a `wait_for_*`/`wait_until_*` call returned without its expected update.
#[derive(Debug, Clone, Error)]
pub enum ListenError {
    /// No matching update arrived before the timeout elapsed.
    #[error("timed out after {0:?} waiting for a matching update")]
    Timeout(Duration),
    /// A cancelling update arrived before a matching one did.
    #[error("listener canceled by update: {0:?}")]
    Canceled(whatsapp_core::update::Update),
    /// The application explicitly stopped the listener.
    #[error("listener stopped")]
    Stopped,
}

/// Errors surfaced by the unified client facade.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A Graph API call failed.
    #[error(transparent)]
    Graph(#[from] whatsapp_graph::GraphError),

    /// Webhook pipeline construction or dispatch failed.
    #[error(transparent)]
    Webhook(#[from] whatsapp_webhook::WebhookError),

    /// A Flow endpoint failed to initialize or process a request.
    #[error(transparent)]
    Flow(#[from] whatsapp_flows::FlowError),

    /// Client configuration was incomplete or invalid.
    #[error(transparent)]
    Config(#[from] whatsapp_core::config::ConfigError),

    /// A `wait_for_*`/`wait_until_*` call did not resolve with a match.
    #[error(transparent)]
    Listen(#[from] ListenError),

    /// No Flow endpoint is registered at the requested path.
    #[error("no flow endpoint registered at path {0:?}")]
    UnknownFlowEndpoint(String),
}
