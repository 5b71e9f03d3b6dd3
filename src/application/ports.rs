use async_trait::async_trait;
use thiserror::Error;

use crate::application::dto::User;

#[cfg(test)]
use mockall::automock;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Port for user persistence operations
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// List users, newest first.
    async fn find_all(&self, limit: i64, offset: i64) -> Result<Vec<User>, RepositoryError>;

    /// Find one user by primary key.
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError>;
}
