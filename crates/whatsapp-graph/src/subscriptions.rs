//! App webhook subscriptions and phone-number registration.

use serde::{Deserialize, Serialize};
use whatsapp_core::ids::{AppId, PhoneId};

use crate::client::GraphClient;
use crate::error::GraphError;

#[derive(Serialize)]
struct SubscribeRequest<'a> {
    object: &'static str,
    callback_url: &'a str,
    verify_token: &'a str,
    fields: &'a [String],
}

#[derive(Deserialize)]
struct AppTokenResponse {
    access_token: String,
}

/// Obtain an app access token via the client-credentials grant
/// (`app_id|app_secret` as the `client_id`/`client_secret` pair), used only
/// to authorize the subscription-registration call below.
///
/// # Errors
///
/// Returns [`GraphError::Provider`] if the app id/secret pair is invalid.
pub async fn app_access_token(client: &GraphClient, app_id: &AppId, app_secret: &str) -> Result<String, GraphError> {
    let path = format!(
        "/oauth/access_token?client_id={}&client_secret={app_secret}&grant_type=client_credentials",
        app_id.as_str()
    );
    let response: AppTokenResponse = client.get(&path).await?;
    Ok(response.access_token)
}

/// Register this app's webhook callback URL with the provider.
///
/// Called on startup when the client is configured with an app ID, app
/// secret, and public callback URL, per the webhook-pipeline bootstrap
/// behavior.
///
/// # Errors
///
/// Returns [`GraphError::Provider`] if the callback URL fails the
/// provider's synchronous verification GET.
pub async fn subscribe(
    client: &GraphClient,
    app_id: &AppId,
    callback_url: &str,
    verify_token: &str,
    fields: &[String],
) -> Result<(), GraphError> {
    let request = SubscribeRequest {
        object: "whatsapp_business_account",
        callback_url,
        verify_token,
        fields,
    };
    let path = GraphClient::path_for(app_id.as_str(), "subscriptions");
    let _: serde_json::Value = client.post_json(&path, &request).await?;
    Ok(())
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    messaging_product: &'static str,
    pin: Option<&'a str>,
}

/// Register a phone number for Cloud API use (required once, after the
/// number is verified in WhatsApp Manager).
///
/// # Errors
///
/// Returns [`GraphError::Provider`] on rejection.
pub async fn register(client: &GraphClient, phone_id: &PhoneId, two_step_pin: Option<&str>) -> Result<(), GraphError> {
    let request = RegisterRequest { messaging_product: "whatsapp", pin: two_step_pin };
    let path = GraphClient::path_for(phone_id.as_str(), "register");
    let _: serde_json::Value = client.post_json(&path, &request).await?;
    Ok(())
}

#[derive(Serialize)]
struct DeregisterRequest {
    messaging_product: &'static str,
}

/// Deregister a phone number (e.g. before porting it to another WABA).
///
/// # Errors
///
/// Returns [`GraphError::Provider`] on rejection.
pub async fn deregister(client: &GraphClient, phone_id: &PhoneId) -> Result<(), GraphError> {
    let request = DeregisterRequest { messaging_product: "whatsapp" };
    let path = GraphClient::path_for(phone_id.as_str(), "deregister");
    let _: serde_json::Value = client.post_json(&path, &request).await?;
    Ok(())
}
