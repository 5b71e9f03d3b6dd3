use axum::{middleware as axum_middleware, routing::get, Router};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::api::envelope::{envelope_middleware, RouteMessages};
use crate::api::handlers::{get_all_users, get_user_by_id, health_handler, readiness_handler};
use crate::api::middleware::{
    context_middleware, rate_limit_middleware, security_headers_middleware, RateLimiter,
};
use crate::api::openapi;
use crate::application::UserService;
use crate::config::Settings;
use crate::infrastructure::S3StorageService;

/// Application state container
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub user_service: Arc<UserService>,
    pub storage: Arc<S3StorageService>,
    /// Absent in router-level tests that run without a database.
    pub pool: Option<PgPool>,
}

/// Create router with all routes and middleware.
///
/// Per-request order: rate limit (when enabled) → security headers →
/// compression → CORS → context populator → route. The success envelope is
/// layered on the app routes only; health probes and Swagger stay unwrapped.
pub fn create_router(state: AppState) -> Router {
    let settings = Arc::clone(&state.settings);

    let prefix = settings.app.api_prefix.trim_matches('/');
    let users_path = format!("/{prefix}/users");
    let user_by_id_path = format!("/{prefix}/users/{{id}}");

    // Per-route response messages, declared at registration time
    let messages = RouteMessages::builder()
        .message(users_path.clone(), "Successfully retrieved!")
        .build();

    let api_routes = Router::new()
        .route(&users_path, get(get_all_users))
        .route(&user_by_id_path, get(get_user_by_id))
        .layer(axum_middleware::from_fn_with_state(
            messages,
            envelope_middleware,
        ));

    let mut app = Router::new()
        .route("/health", get(health_handler))
        .route("/health/ready", get(readiness_handler))
        .merge(api_routes)
        .with_state(state);

    if settings.swagger_enabled() {
        app = app.merge(openapi::swagger_ui(&settings.swagger));
    }

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(AllowMethods::any())
        .allow_headers(AllowHeaders::any());

    let mut app = app
        .layer(axum_middleware::from_fn_with_state(
            Arc::clone(&settings),
            context_middleware,
        ))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(axum_middleware::from_fn(security_headers_middleware));

    if settings.rate_limit.enabled {
        let limiter = Arc::new(RateLimiter::new(&settings.rate_limit));
        RateLimiter::spawn_cleanup(Arc::clone(&limiter));
        app = app.layer(axum_middleware::from_fn_with_state(
            limiter,
            rate_limit_middleware,
        ));
    }

    app
}
