//! Axum router binding the webhook pipeline's two entry points.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use crate::pipeline::WebhookPipeline;

/// Query parameters WhatsApp sends on the subscription-verification GET.
#[derive(Debug, Deserialize)]
struct ChallengeParams {
    #[serde(rename = "hub.mode")]
    mode: String,
    #[serde(rename = "hub.verify_token")]
    verify_token: String,
    #[serde(rename = "hub.challenge")]
    challenge: String,
}

/// Build a router exposing `GET /webhook` (subscription challenge) and
/// `POST /webhook` (update delivery) for the given pipeline.
pub fn router<C: Clone + Send + Sync + 'static>(pipeline: Arc<WebhookPipeline<C>>, ctx: C) -> Router
where
    C: 'static,
{
    Router::new()
        .route("/webhook", get(challenge_handler::<C>).post(update_handler::<C>))
        .with_state((pipeline, ctx))
}

async fn challenge_handler<C: Clone + Send + Sync + 'static>(
    State((pipeline, _ctx)): State<(Arc<WebhookPipeline<C>>, C)>,
    Query(params): Query<ChallengeParams>,
) -> Response {
    match pipeline.handle_challenge(&params.mode, &params.verify_token, &params.challenge) {
        Some(challenge) => (StatusCode::OK, challenge).into_response(),
        None => StatusCode::FORBIDDEN.into_response(),
    }
}

async fn update_handler<C: Clone + Send + Sync + 'static>(
    State((pipeline, ctx)): State<(Arc<WebhookPipeline<C>>, C)>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Response {
    let signature = headers
        .get("X-Hub-Signature-256")
        .and_then(|v| v.to_str().ok());

    match pipeline.handle_update(ctx, &body, signature).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => {
            tracing::warn!(error = %err, "webhook update rejected");
            let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::BAD_REQUEST);
            status.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::ListenerCoordinator;
    use crate::pipeline::WebhookConfig;
    use crate::registry::HandlerRegistry;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let pipeline = Arc::new(WebhookPipeline::<()>::new(
            WebhookConfig { verify_token: "secret".to_string(), app_secret: None, filter_phone_id: None },
            HandlerRegistry::new(),
            Arc::new(ListenerCoordinator::new()),
        ));
        router(pipeline, ())
    }

    #[tokio::test]
    async fn challenge_get_echoes_challenge_on_matching_token() {
        let app = test_router();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/webhook?hub.mode=subscribe&hub.verify_token=secret&hub.challenge=123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn challenge_get_rejects_mismatched_token() {
        let app = test_router();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/webhook?hub.mode=subscribe&hub.verify_token=wrong&hub.challenge=123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn update_post_accepts_well_formed_envelope() {
        let app = test_router();
        let body = serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [],
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhook")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
