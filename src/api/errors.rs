//! API error type and the error envelope translators.
//!
//! Every error that can reach a client is one variant of [`ApiError`]; the
//! `IntoResponse` impl is the single outermost boundary where each category
//! is translated into its envelope. Precedence between categories is the
//! match order: the not-found translator runs before the generic
//! HTTP-status one, so its forced localized message is never shadowed.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use validator::ValidationErrors;

use crate::context::RequestContext;
use crate::i18n;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource-not-found. The response message is always resolved from the
    /// localization catalog; whatever text the throw site had is discarded.
    #[error("resource not found")]
    NotFound,

    /// An error that deliberately maps to a client-visible HTTP status.
    /// `message` is either a string or an array of strings; `payload` is an
    /// optional structured object echoed back to the client.
    #[error("http error {status}")]
    Http {
        status: StatusCode,
        message: Value,
        payload: Option<Value>,
    },

    /// Structured input-validation failure, translated field by field.
    #[error("validation failed")]
    Validation(#[from] ValidationErrors),

    /// Anything uncategorized. Guards against a raw error reaching the
    /// client as a stack trace.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: Value::String(message.into()),
            payload: None,
        }
    }

    pub fn http_with_payload(
        status: StatusCode,
        message: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self::Http {
            status,
            message: Value::String(message.into()),
            payload: Some(payload),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::http(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<crate::application::ports::RepositoryError> for ApiError {
    fn from(err: crate::application::ports::RepositoryError) -> Self {
        use crate::application::ports::RepositoryError;
        match err {
            RepositoryError::NotFound => ApiError::NotFound,
            RepositoryError::Database(e) => ApiError::from(e),
            RepositoryError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

/// Standard error envelope for the not-found / http-status / validation
/// categories.
fn error_envelope(status: StatusCode, message: Value, payload: Value) -> Response {
    let body = Json(json!({
        "success": false,
        "status": status.as_u16(),
        "message": message,
        "payload": payload,
    }));
    (status, body).into_response()
}

/// Translate validator output into localized per-field messages.
fn translate_validation_errors(errors: &ValidationErrors) -> Vec<String> {
    let lang = RequestContext::current_lang();
    let mut messages = Vec::new();
    for (field, field_errors) in errors.field_errors() {
        for error in field_errors.iter() {
            messages.push(i18n::validation_message(
                &error.code,
                field.as_ref(),
                lang.as_deref(),
            ));
        }
    }
    messages.sort();
    messages
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            // Not-found translator: forced localized message, status 404.
            ApiError::NotFound => {
                let message = i18n::translate_current("error.NOT_FOUND");
                error_envelope(
                    StatusCode::NOT_FOUND,
                    Value::String(message),
                    Value::Null,
                )
            }

            // HTTP-status translator: one formatted log entry, then the
            // standard envelope with the error's own message and payload.
            ApiError::Http {
                status,
                message,
                payload,
            } => {
                let (method, path) = RequestContext::with_current(|ctx| {
                    (ctx.method.clone(), ctx.path.clone())
                })
                .unwrap_or_default();
                tracing::error!(
                    method = %method,
                    path = %path,
                    status = status.as_u16(),
                    "{} {} : {}",
                    method,
                    path,
                    message
                );
                error_envelope(status, message, payload.unwrap_or(Value::Null))
            }

            // Validation translator: localized field messages, then the
            // standard envelope shape with a message array.
            ApiError::Validation(errors) => {
                let messages = translate_validation_errors(&errors);
                error_envelope(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Value::Array(messages.into_iter().map(Value::String).collect()),
                    Value::Null,
                )
            }

            // Catch-all translator: alternate envelope shape. The raw
            // message string is forwarded as the original service did; no
            // source chain or backtrace ever leaves the process.
            ApiError::Internal(message) => {
                let path = RequestContext::with_current(|ctx| ctx.path.clone())
                    .unwrap_or_default();
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                let body = Json(json!({
                    "statusCode": status.as_u16(),
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                    "path": path,
                    "message": message,
                }));
                (status, body).into_response()
            }
        }
    }
}
