//! Message template management (`/<waba_id>/message_templates`).

use serde::Deserialize;
use whatsapp_core::ids::{TemplateId, WabaId};
use whatsapp_core::template::{AuthTemplateDeclaration, TemplateDeclaration};

use crate::client::GraphClient;
use crate::error::GraphError;

#[derive(Deserialize)]
struct CreateTemplateResponse {
    id: String,
    status: Option<String>,
    category: Option<String>,
}

/// The subset of the create/update response useful before a full re-fetch.
#[derive(Debug, Clone)]
pub struct TemplateCreated {
    /// The newly assigned template ID.
    pub id: TemplateId,
    /// Initial status, usually `"PENDING"`.
    pub status: Option<String>,
    /// Category, echoed back (the provider may recategorize on review).
    pub category: Option<String>,
}

/// Create a message template.
///
/// # Errors
///
/// Returns [`GraphError::Provider`] if the declaration is rejected outright
/// (malformed, duplicate name+language, disallowed category).
pub async fn create(
    client: &GraphClient,
    waba_id: &WabaId,
    declaration: &TemplateDeclaration,
) -> Result<TemplateCreated, GraphError> {
    let path = GraphClient::path_for(waba_id.as_str(), "message_templates");
    let response: CreateTemplateResponse = client.post_json(&path, declaration).await?;
    Ok(TemplateCreated {
        id: TemplateId::new(response.id),
        status: response.status,
        category: response.category,
    })
}

/// Create an authentication (OTP) template across several languages at once.
///
/// # Errors
///
/// Returns [`GraphError::Provider`] on rejection.
pub async fn create_auth_template(
    client: &GraphClient,
    waba_id: &WabaId,
    declaration: &AuthTemplateDeclaration,
) -> Result<TemplateCreated, GraphError> {
    let path = GraphClient::path_for(waba_id.as_str(), "message_templates");
    let response: CreateTemplateResponse = client.post_json(&path, declaration).await?;
    Ok(TemplateCreated {
        id: TemplateId::new(response.id),
        status: response.status,
        category: response.category,
    })
}

#[derive(Deserialize)]
struct ListTemplatesResponse {
    data: Vec<TemplateDeclaration>,
}

/// List all templates registered to a WABA.
///
/// # Errors
///
/// Returns [`GraphError::Provider`] on failure.
pub async fn list(client: &GraphClient, waba_id: &WabaId) -> Result<Vec<TemplateDeclaration>, GraphError> {
    let path = GraphClient::path_for(waba_id.as_str(), "message_templates");
    let response: ListTemplatesResponse = client.get(&path).await?;
    Ok(response.data)
}

/// Update an existing template's components (name/language/category are immutable).
///
/// # Errors
///
/// Returns [`GraphError::Provider`] on rejection.
pub async fn update(
    client: &GraphClient,
    template_id: &TemplateId,
    declaration: &TemplateDeclaration,
) -> Result<(), GraphError> {
    let path = GraphClient::path_for(template_id.as_str(), "");
    let _: serde_json::Value = client.post_json(&path, declaration).await?;
    Ok(())
}

/// Delete a template by name (optionally by `hsm_id` for a specific language variant).
///
/// # Errors
///
/// Returns [`GraphError::Provider`] if no matching template exists.
pub async fn delete(
    client: &GraphClient,
    waba_id: &WabaId,
    name: &str,
    hsm_id: Option<&TemplateId>,
) -> Result<(), GraphError> {
    let mut path = format!(
        "{}?name={name}",
        GraphClient::path_for(waba_id.as_str(), "message_templates")
    );
    if let Some(hsm_id) = hsm_id {
        path.push_str(&format!("&hsm_id={}", hsm_id.as_str()));
    }
    let _: serde_json::Value = client.delete(&path).await?;
    Ok(())
}

/// Lift a paused (quality-review) template back to active sending.
///
/// # Errors
///
/// Returns [`GraphError::Provider`] if the template isn't currently paused.
pub async fn unpause(client: &GraphClient, template_id: &TemplateId) -> Result<(), GraphError> {
    let path = GraphClient::path_for(template_id.as_str(), "unpause");
    let _: serde_json::Value = client.post_empty(&path).await?;
    Ok(())
}

/// Migrate all templates from one WABA to another (used during number-porting).
///
/// # Errors
///
/// Returns [`GraphError::Provider`] on rejection.
pub async fn migrate(
    client: &GraphClient,
    source_waba_id: &WabaId,
    dest_waba_id: &WabaId,
) -> Result<(), GraphError> {
    #[derive(serde::Serialize)]
    struct MigrateRequest<'a> {
        dest_waba_id: &'a str,
    }
    let path = GraphClient::path_for(source_waba_id.as_str(), "migrate_message_templates");
    let _: serde_json::Value = client
        .post_json(&path, &MigrateRequest { dest_waba_id: dest_waba_id.as_str() })
        .await?;
    Ok(())
}
