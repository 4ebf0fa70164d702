//! Flow management (`/<waba_id>/flows`) — creating, publishing, and
//! versioning Flow definitions. Distinct from the `whatsapp-flows` crate,
//! which processes the *runtime* request/response exchange with an already
//! published flow.

use serde::{Deserialize, Serialize};
use whatsapp_core::ids::{FlowId, WabaId};

use crate::client::GraphClient;
use crate::error::GraphError;

/// A flow creation request.
#[derive(Debug, Clone, Serialize)]
pub struct CreateFlowRequest<'a> {
    /// Flow display name.
    pub name: &'a str,
    /// Categories the flow applies to (e.g. `"SIGN_UP"`, `"APPOINTMENT_BOOKING"`).
    pub categories: &'a [&'a str],
    /// Whether to clone an existing flow's content as the starting point.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clone_flow_id: Option<&'a str>,
}

#[derive(Deserialize)]
struct CreateFlowResponse {
    id: String,
}

/// Create a new (draft) flow.
///
/// # Errors
///
/// Returns [`GraphError::Provider`] on rejection.
pub async fn create(
    client: &GraphClient,
    waba_id: &WabaId,
    request: &CreateFlowRequest<'_>,
) -> Result<FlowId, GraphError> {
    let path = GraphClient::path_for(waba_id.as_str(), "flows");
    let response: CreateFlowResponse = client.post_json(&path, request).await?;
    Ok(FlowId::new(response.id))
}

/// A flow's metadata, as returned by `GET /<flow_id>`.
#[derive(Debug, Clone, Deserialize)]
pub struct FlowMetadata {
    /// Flow ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Current lifecycle status (`DRAFT`, `PUBLISHED`, `DEPRECATED`, …).
    pub status: String,
    /// Categories the flow applies to.
    pub categories: Vec<String>,
    /// Validation errors from the last asset upload, if any.
    pub validation_errors: Option<Vec<serde_json::Value>>,
}

/// Fetch a flow's current metadata.
///
/// # Errors
///
/// Returns [`GraphError::Provider`] if the flow doesn't exist.
pub async fn get(client: &GraphClient, flow_id: &FlowId) -> Result<FlowMetadata, GraphError> {
    let path = GraphClient::path_for(flow_id.as_str(), "");
    client.get(&path).await
}

/// Upload the flow's JSON asset (its screens/layout definition).
///
/// # Errors
///
/// Returns [`GraphError::Provider`] if the asset fails validation.
pub async fn upload_asset(
    client: &GraphClient,
    flow_id: &FlowId,
    flow_json: &serde_json::Value,
) -> Result<(), GraphError> {
    let part = reqwest::multipart::Part::bytes(serde_json::to_vec(flow_json)?)
        .file_name("flow.json")
        .mime_str("application/json")
        .map_err(|e| GraphError::MediaResolution(e.to_string()))?;
    let form = reqwest::multipart::Form::new()
        .text("asset_type", "FLOW_JSON")
        .text("name", "flow.json")
        .part("file", part);
    let path = GraphClient::path_for(flow_id.as_str(), "assets");
    let _: serde_json::Value = client.post_multipart(&path, form).await?;
    Ok(())
}

/// Publish a draft flow, making it sendable.
///
/// # Errors
///
/// Returns [`GraphError::Provider`] if the flow has outstanding validation errors.
pub async fn publish(client: &GraphClient, flow_id: &FlowId) -> Result<(), GraphError> {
    let path = GraphClient::path_for(flow_id.as_str(), "publish");
    let _: serde_json::Value = client.post_empty(&path).await?;
    Ok(())
}

/// Deprecate a published flow (stops new sends; existing conversations still work).
///
/// # Errors
///
/// Returns [`GraphError::Provider`] if the flow is not currently published.
pub async fn deprecate(client: &GraphClient, flow_id: &FlowId) -> Result<(), GraphError> {
    let path = GraphClient::path_for(flow_id.as_str(), "deprecate");
    let _: serde_json::Value = client.post_empty(&path).await?;
    Ok(())
}

/// Delete a draft flow (published flows must be deprecated, not deleted).
///
/// # Errors
///
/// Returns [`GraphError::Provider`] if the flow is not in `DRAFT` status.
pub async fn delete(client: &GraphClient, flow_id: &FlowId) -> Result<(), GraphError> {
    let path = GraphClient::path_for(flow_id.as_str(), "");
    let _: serde_json::Value = client.delete(&path).await?;
    Ok(())
}
