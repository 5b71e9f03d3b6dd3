use axum::{extract::State, response::Json};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::extractors::{Path, Query};
use crate::api::router::AppState;
use crate::application::dto::{Pagination, UserDto};

/// GET /api/users
/// List users with pagination
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    params(Pagination),
    responses(
        (status = 200, description = "Users retrieved", body = Vec<UserDto>),
        (status = 422, description = "Invalid pagination parameters")
    )
)]
pub async fn get_all_users(
    State(state): State<AppState>,
    Query(pagination): Query<Pagination>,
) -> Result<Json<Vec<UserDto>>, ApiError> {
    pagination.validate()?;

    let users = state.user_service.get_all_users(&pagination).await?;
    Ok(Json(users))
}

/// GET /api/users/{id}
/// Fetch a single user
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserDto),
        (status = 404, description = "User does not exist")
    )
)]
pub async fn get_user_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserDto>, ApiError> {
    let user = state.user_service.get_user_by_id(id).await?;
    Ok(Json(user))
}
