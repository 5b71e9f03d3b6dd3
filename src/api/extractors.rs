//! Query and path extractors whose rejections use the error envelope.
//!
//! axum's built-in extractors answer malformed input with a plain-text body,
//! which would be the one place a non-JSON error could reach a client. These
//! wrappers convert the rejection into an [`ApiError`] so it goes through the
//! same translators as every other error.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use crate::api::errors::ApiError;

/// Drop-in replacement for [`axum::extract::Query`].
#[derive(Debug, Clone, Copy)]
pub struct Query<T>(pub T);

impl<T, S> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Query::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::http(rejection.status(), rejection.body_text())),
        }
    }
}

/// Drop-in replacement for [`axum::extract::Path`].
#[derive(Debug, Clone, Copy)]
pub struct Path<T>(pub T);

impl<T, S> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Path::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Path(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::http(rejection.status(), rejection.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        routing::get,
        Json, Router,
    };
    use serde::Deserialize;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;

    #[derive(Deserialize)]
    struct Page {
        page: u32,
    }

    fn test_router() -> Router {
        Router::new()
            .route(
                "/items/{id}",
                get(|Path(id): Path<i64>| async move { Json(json!({"id": id})) }),
            )
            .route(
                "/items",
                get(|Query(q): Query<Page>| async move { Json(json!({"page": q.page})) }),
            )
    }

    async fn fetch(uri: &str) -> (StatusCode, Value) {
        let response = test_router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_valid_input_passes_through() {
        let (status, body) = fetch("/items/7").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], json!(7));
    }

    #[tokio::test]
    async fn test_bad_path_param_yields_json_envelope() {
        let (status, body) = fetch("/items/abc").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        // JSON envelope, not axum's plain-text rejection
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["status"], json!(400));
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_bad_query_param_yields_json_envelope() {
        let (status, body) = fetch("/items?page=abc").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], json!(false));
        assert!(body["message"].is_string());
    }
}
