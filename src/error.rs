use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::domain::ValidationError;
use crate::repository::RepositoryError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::BadRequest(err.0)
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => AppError::NotFound(msg),
            RepositoryError::Invalid(msg) => AppError::BadRequest(msg),
            RepositoryError::Forbidden(msg) => AppError::Forbidden(msg),
            RepositoryError::Database(e) => AppError::Pool(e),
            RepositoryError::Sql(e) => AppError::Database(e),
            RepositoryError::Serialization(e) => AppError::Json(e),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::NotFound(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::BadRequest(msg) => msg,
            // Server-side failures are logged, never echoed to the client
            other => {
                tracing::error!(error = %other, "Request failed");
                "Internal server error".to_string()
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_keep_their_status() {
        let cases = [
            (AppError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (AppError::Unauthorized("who?".into()), StatusCode::UNAUTHORIZED),
            (AppError::Forbidden("not yours".into()), StatusCode::FORBIDDEN),
            (AppError::BadRequest("oops".into()), StatusCode::BAD_REQUEST),
            (AppError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn repository_errors_map_to_statuses() {
        let cases = [
            (RepositoryError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (RepositoryError::Invalid("x".into()), StatusCode::BAD_REQUEST),
            (RepositoryError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (
                RepositoryError::Sql(rusqlite::Error::QueryReturnedNoRows),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn validation_errors_are_bad_requests() {
        let err = AppError::from(ValidationError::new("Title and content are required!"));
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Title and content are required!"));
    }

    async fn body_of(err: AppError) -> serde_json::Value {
        let bytes = axum::body::to_bytes(err.into_response().into_body(), 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn body_carries_message() {
        let body = body_of(AppError::Forbidden("not yours".into())).await;
        assert_eq!(body["message"], "not yours");
    }

    #[tokio::test]
    async fn internal_details_are_hidden() {
        let body = body_of(AppError::Internal("disk on fire".into())).await;
        assert_eq!(body["message"], "Internal server error");
    }
}
