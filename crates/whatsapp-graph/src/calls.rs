//! WhatsApp Business Calling API (`/<phone_id>/calls`).

use serde::{Deserialize, Serialize};
use whatsapp_core::ids::{CallId, PhoneId};

use crate::client::GraphClient;
use crate::error::GraphError;

/// SDP session description carried by a call action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSession {
    /// SDP type (`"offer"` or `"answer"`).
    pub sdp_type: String,
    /// The SDP body.
    pub sdp: String,
}

#[derive(Serialize)]
struct InitiateCallRequest<'a> {
    messaging_product: &'static str,
    to: &'a str,
    action: &'static str,
    session: &'a CallSession,
}

#[derive(Deserialize)]
struct InitiateCallResponse {
    calls: Vec<CallIdEnvelope>,
}

#[derive(Deserialize)]
struct CallIdEnvelope {
    id: String,
}

/// Place an outbound call, offering an SDP session.
///
/// # Errors
///
/// Returns [`GraphError::Provider`] on rejection (the Calling API must be
/// enabled on the phone number, and the recipient must have call permission).
pub async fn initiate(
    client: &GraphClient,
    phone_id: &PhoneId,
    to: &str,
    session: &CallSession,
) -> Result<CallId, GraphError> {
    let request = InitiateCallRequest {
        messaging_product: "whatsapp",
        to,
        action: "connect",
        session,
    };
    let path = GraphClient::path_for(phone_id.as_str(), "calls");
    let response: InitiateCallResponse = client.post_json(&path, &request).await?;
    response
        .calls
        .into_iter()
        .next()
        .map(|c| CallId::new(c.id))
        .ok_or_else(|| GraphError::MediaResolution("call response carried no call id".into()))
}

#[derive(Serialize)]
struct CallActionRequest<'a> {
    messaging_product: &'static str,
    action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<&'a CallSession>,
}

async fn call_action(
    client: &GraphClient,
    phone_id: &PhoneId,
    call_id: &CallId,
    action: &'static str,
    session: Option<&CallSession>,
) -> Result<(), GraphError> {
    let request = CallActionRequest {
        messaging_product: "whatsapp",
        action,
        session,
    };
    let path = format!(
        "{}/{}",
        GraphClient::path_for(phone_id.as_str(), "calls"),
        call_id.as_str()
    );
    let _: serde_json::Value = client.post_json(&path, &request).await?;
    Ok(())
}

/// Pre-accept an inbound call (signals readiness before the full accept).
///
/// # Errors
///
/// Returns [`GraphError::Provider`] on rejection.
pub async fn pre_accept(client: &GraphClient, phone_id: &PhoneId, call_id: &CallId, session: &CallSession) -> Result<(), GraphError> {
    call_action(client, phone_id, call_id, "pre_accept", Some(session)).await
}

/// Accept an inbound call, answering with an SDP session.
///
/// # Errors
///
/// Returns [`GraphError::Provider`] on rejection.
pub async fn accept(client: &GraphClient, phone_id: &PhoneId, call_id: &CallId, session: &CallSession) -> Result<(), GraphError> {
    call_action(client, phone_id, call_id, "accept", Some(session)).await
}

/// Reject an inbound call.
///
/// # Errors
///
/// Returns [`GraphError::Provider`] on rejection.
pub async fn reject(client: &GraphClient, phone_id: &PhoneId, call_id: &CallId) -> Result<(), GraphError> {
    call_action(client, phone_id, call_id, "reject", None).await
}

/// Terminate an in-progress call.
///
/// # Errors
///
/// Returns [`GraphError::Provider`] on rejection.
pub async fn terminate(client: &GraphClient, phone_id: &PhoneId, call_id: &CallId) -> Result<(), GraphError> {
    call_action(client, phone_id, call_id, "terminate", None).await
}
