use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::application::dto::{ApiResponse, UserDto};
use crate::config::SwaggerSettings;

/// OpenAPI specification for the Backbone API
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::health::health_handler,
        crate::api::handlers::health::readiness_handler,
        crate::api::handlers::users::get_all_users,
        crate::api::handlers::users::get_user_by_id,
    ),
    components(
        schemas(
            UserDto,
            ApiResponse<UserDto>,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "Users example vertical slice")
    )
)]
pub struct ApiDoc;

/// Create the Swagger UI route, with info taken from settings
pub fn swagger_ui(settings: &SwaggerSettings) -> SwaggerUi {
    let mut doc = ApiDoc::openapi();
    doc.info.title = settings.title.clone();
    doc.info.description = Some(settings.description.clone());
    doc.info.version = settings.version.clone();

    SwaggerUi::new(settings.path.clone()).url("/api-docs/openapi.json", doc)
}
