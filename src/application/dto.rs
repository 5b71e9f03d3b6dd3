use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// User row as persisted. The scaffold's only entity, so it lives next to
/// its DTO instead of in a dedicated domain tree.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// DTO for user responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Pagination query parameters shared by list endpoints.
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 10))]
    pub limit: Option<u32>,
}

impl Pagination {
    pub fn limit(&self) -> i64 {
        i64::from(self.limit.unwrap_or(10))
    }

    pub fn offset(&self) -> i64 {
        let page = i64::from(self.page.unwrap_or(1));
        (page - 1) * self.limit()
    }
}

/// Success envelope schema, documented for Swagger consumers. The actual
/// wrapping happens in the envelope middleware.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

#[cfg(test)]
mod tests {
    use validator::Validate;

    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let pagination = Pagination::default();
        assert_eq!(pagination.limit(), 10);
        assert_eq!(pagination.offset(), 0);
    }

    #[test]
    fn test_pagination_offset() {
        let pagination = Pagination {
            page: Some(3),
            limit: Some(20),
        };
        assert_eq!(pagination.limit(), 20);
        assert_eq!(pagination.offset(), 40);
    }

    #[test]
    fn test_pagination_validation_bounds() {
        assert!(Pagination {
            page: Some(0),
            limit: None
        }
        .validate()
        .is_err());
        assert!(Pagination {
            page: None,
            limit: Some(5)
        }
        .validate()
        .is_err());
        assert!(Pagination {
            page: Some(1),
            limit: Some(10)
        }
        .validate()
        .is_ok());
        assert!(Pagination::default().validate().is_ok());
    }

    #[test]
    fn test_user_dto_from_user() {
        let user = User {
            id: 7,
            name: "Ayu".to_string(),
            email: "ayu@example.com".to_string(),
            created_at: Utc::now(),
        };
        let dto = UserDto::from(user.clone());
        assert_eq!(dto.id, 7);
        assert_eq!(dto.email, user.email);
        assert!(chrono::DateTime::parse_from_rfc3339(&dto.created_at).is_ok());
    }
}
