use std::sync::Arc;

use crate::application::dto::{Pagination, UserDto};
use crate::application::ports::{RepositoryError, UserRepository};

/// Users service: the example vertical slice between controller and
/// repository.
pub struct UserService {
    repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    pub async fn get_all_users(
        &self,
        pagination: &Pagination,
    ) -> Result<Vec<UserDto>, RepositoryError> {
        let users = self
            .repo
            .find_all(pagination.limit(), pagination.offset())
            .await?;
        Ok(users.into_iter().map(UserDto::from).collect())
    }

    pub async fn get_user_by_id(&self, id: i64) -> Result<UserDto, RepositoryError> {
        let user = self
            .repo
            .find_by_id(id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        Ok(UserDto::from(user))
    }
}
