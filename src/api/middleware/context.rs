//! Context populator middleware.
//!
//! Runs once per request before the handler. Collects raw headers and query
//! parameters, resolves timezone and language from the configured header
//! names, then executes the rest of the stack inside the request context
//! scope. Never short-circuits: the inner service always runs.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::config::Settings;
use crate::context::RequestContext;

pub async fn context_middleware(
    State(settings): State<Arc<Settings>>,
    request: Request,
    next: Next,
) -> Response {
    let headers: HashMap<String, String> = request
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    let params: HashMap<String, String> = request
        .uri()
        .query()
        .and_then(|query| serde_urlencoded::from_str(query).ok())
        .unwrap_or_default();

    // Header names arrive lowercased from the HTTP layer
    let timezone_key = settings.header_key.timezone.to_lowercase();
    let lang_key = settings.header_key.lang.to_lowercase();

    let timezone = headers
        .get(&timezone_key)
        .cloned()
        .unwrap_or_else(|| settings.app.timezone.clone());
    let lang = headers.get(&lang_key).cloned();

    // Full path including the query string, like the URL clients see
    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let ctx = RequestContext {
        method: request.method().to_string(),
        path,
        headers,
        params,
        timezone,
        lang,
    };

    RequestContext::scope(ctx, next.run(request)).await
}
