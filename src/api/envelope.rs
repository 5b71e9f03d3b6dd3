//! Success envelope transformer.
//!
//! Runs after a handler produced a response. 2xx JSON bodies are replaced
//! with `{"success": true, "message": ..., "data": <original body>}`; the
//! per-route message comes from a [`RouteMessages`] registry populated at
//! route-registration time and keyed by the matched route pattern. Error
//! responses bypass this layer entirely, they are shaped by the translators
//! in [`crate::api::errors`].

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{MatchedPath, Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::{json, Value};

use crate::api::errors::ApiError;

/// Message used when a route declares none.
pub const DEFAULT_MESSAGE: &str = "Request successful";

/// Registry of per-route response messages, keyed by route pattern
/// (e.g. `/api/users/{id}`). Built once in the router, shared read-only.
#[derive(Debug, Clone, Default)]
pub struct RouteMessages {
    messages: Arc<HashMap<String, &'static str>>,
}

impl RouteMessages {
    pub fn builder() -> RouteMessagesBuilder {
        RouteMessagesBuilder::default()
    }

    pub fn get(&self, route: &str) -> Option<&'static str> {
        self.messages.get(route).copied()
    }
}

#[derive(Debug, Default)]
pub struct RouteMessagesBuilder {
    messages: HashMap<String, &'static str>,
}

impl RouteMessagesBuilder {
    /// Declare the success message for a route pattern.
    pub fn message(mut self, route: impl Into<String>, message: &'static str) -> Self {
        self.messages.insert(route.into(), message);
        self
    }

    pub fn build(self) -> RouteMessages {
        RouteMessages {
            messages: Arc::new(self.messages),
        }
    }
}

/// Wrap successful JSON responses in the standard success envelope.
pub async fn envelope_middleware(
    State(messages): State<RouteMessages>,
    request: Request,
    next: Next,
) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string());

    let response = next.run(request).await;

    // Error responses keep the translator-produced shape untouched.
    if !response.status().is_success() {
        return response;
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/json"))
        .unwrap_or(false);
    if !is_json {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return ApiError::internal_error(format!("failed to buffer response body: {e}"))
                .into_response()
        }
    };

    let data: Value = match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        // Declared JSON but unparsable: pass the original body through
        Err(_) => return Response::from_parts(parts, Body::from(bytes)),
    };

    let message = route
        .as_deref()
        .and_then(|r| messages.get(r))
        .unwrap_or(DEFAULT_MESSAGE);

    let wrapped = json!({
        "success": true,
        "message": message,
        "data": data,
    });

    let body = match serde_json::to_vec(&wrapped) {
        Ok(body) => body,
        Err(e) => {
            return ApiError::internal_error(format!("failed to encode envelope: {e}"))
                .into_response()
        }
    };

    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(body))
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, middleware, routing::get, Json, Router};
    use tower::ServiceExt;

    use super::*;

    fn test_router() -> Router {
        let messages = RouteMessages::builder()
            .message("/declared", "Successfully retrieved!")
            .build();

        Router::new()
            .route("/declared", get(|| async { Json(json!({"id": 1})) }))
            .route("/plain", get(|| async { Json(json!([1, 2, 3])) }))
            .route("/text", get(|| async { "not json" }))
            .route(
                "/fails",
                get(|| async { ApiError::bad_request("broken") }),
            )
            .layer(middleware::from_fn_with_state(
                messages,
                envelope_middleware,
            ))
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(
                axum::http::Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_declared_message_is_used() {
        let (status, body) = get_json(test_router(), "/declared").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"success": true, "message": "Successfully retrieved!", "data": {"id": 1}})
        );
    }

    #[tokio::test]
    async fn test_default_message_without_declaration() {
        let (status, body) = get_json(test_router(), "/plain").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"success": true, "message": "Request successful", "data": [1, 2, 3]})
        );
    }

    #[tokio::test]
    async fn test_error_responses_bypass_envelope() {
        let (status, body) = get_json(test_router(), "/fails").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        // Translator shape, not the success envelope
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["message"], json!("broken"));
    }

    #[tokio::test]
    async fn test_non_json_success_passes_through() {
        let response = test_router()
            .oneshot(
                axum::http::Request::builder()
                    .uri("/text")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"not json");
    }
}
