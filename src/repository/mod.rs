// Repository pattern - isolates all database side effects
pub mod blogs;
pub mod comments;
pub mod users;

use thiserror::Error;

use crate::domain::ValidationError;

pub use blogs::{BlogRepository, SqliteBlogRepository};
pub use comments::{CommentRepository, SqliteCommentRepository};
pub use users::{SqliteUserRepository, UserRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    Forbidden(String),
}

impl From<ValidationError> for RepositoryError {
    fn from(err: ValidationError) -> Self {
        RepositoryError::Invalid(err.0)
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

