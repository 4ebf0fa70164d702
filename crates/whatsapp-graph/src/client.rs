//! The HTTP client wrapping a single Graph API host + version.

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use whatsapp_core::secrets::ApiKey;

use crate::error::GraphError;

const DEFAULT_HOST: &str = "https://graph.facebook.com";

/// A thin typed wrapper over `graph.facebook.com/v<version>`.
///
/// One instance per logical WhatsApp client; never shared between distinct
/// client configurations, since the bearer token is bound at construction.
#[derive(Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    host: String,
    api_version: String,
    token: ApiKey,
}

impl GraphClient {
    /// Build a client targeting the default `graph.facebook.com` host.
    #[must_use]
    pub fn new(token: ApiKey, api_version: impl Into<String>) -> Self {
        Self::with_host(token, api_version, DEFAULT_HOST)
    }

    /// Build a client targeting an arbitrary host (used by tests against a
    /// mock server).
    #[must_use]
    pub fn with_host(token: ApiKey, api_version: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            host: host.into(),
            api_version: api_version.into(),
            token,
        }
    }

    /// The bearer token this client authenticates with.
    pub(crate) fn token(&self) -> &ApiKey {
        &self.token
    }

    /// The host this client targets (e.g. `https://graph.facebook.com`).
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The API version prefix this client uses (e.g. `"v21.0"`).
    #[must_use]
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// The underlying `reqwest::Client`, for callers assembling multipart
    /// bodies this wrapper doesn't expose a convenience for.
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}{path}", self.host, self.api_version)
    }

    /// A fully qualified absolute URL (e.g. a provider-returned media signed
    /// URL), bypassing the `/v<version>` prefix.
    pub(crate) fn absolute(&self, url: &str) -> String {
        url.to_string()
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, GraphError> {
        let response = request
            .bearer_auth(self.token.expose())
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let err = GraphError::from_body(status.as_u16(), &body);
            tracing::warn!("Graph API call failed: {err}");
            return Err(err);
        }
        serde_json::from_str(&body).map_err(GraphError::from)
    }

    /// `GET /<path>` relative to `/v<version>`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GraphError> {
        self.send(self.http.request(Method::GET, self.url(path))).await
    }

    /// `GET` against an absolute URL (e.g. a media signed URL), returning raw bytes.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, GraphError> {
        let response = self
            .http
            .get(self.absolute(url))
            .bearer_auth(self.token.expose())
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GraphError::from_body(status.as_u16(), &body));
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// `POST /<path>` with a JSON body.
    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GraphError> {
        self.send(self.http.request(Method::POST, self.url(path)).json(body))
            .await
    }

    /// `POST /<path>` with no body (some endpoints, e.g. `/publish`, take none).
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, GraphError> {
        self.send(self.http.request(Method::POST, self.url(path))).await
    }

    /// `POST /<path>` with a pre-built multipart form (used by media upload).
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, GraphError> {
        self.send(
            self.http
                .request(Method::POST, self.url(path))
                .multipart(form),
        )
        .await
    }

    /// `DELETE /<path>`.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, GraphError> {
        self.send(self.http.request(Method::DELETE, self.url(path))).await
    }

    /// The phone-number-scoped `/<phone_id>` path prefix, used by callers
    /// assembling endpoint paths.
    #[must_use]
    pub fn path_for(entity_id: &str, suffix: &str) -> String {
        if suffix.is_empty() {
            format!("/{entity_id}")
        } else {
            format!("/{entity_id}/{suffix}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_translates_provider_error() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {
                    "message": "Invalid OAuth access token",
                    "type": "OAuthException",
                    "code": 190,
                    "fbtrace_id": "abc123",
                }
            })))
            .mount(&server)
            .await;

        let client = GraphClient::with_host(ApiKey::new("bad-token".to_string()), "v21.0", server.uri());
        let err = client.get::<serde_json::Value>("/123456").await.unwrap_err();
        assert!(matches!(
            err,
            GraphError::Provider { code: 190, .. }
        ));
    }
}
