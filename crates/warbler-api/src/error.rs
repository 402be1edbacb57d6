use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use warbler_db::DbError;

#[derive(Debug, Error)]
pub enum AppError {
    /// No valid session on a gated route.
    #[error("Access unauthorized.")]
    Unauthorized,

    /// Valid session, but the row belongs to someone else.
    #[error("Access unauthorized.")]
    Forbidden,

    #[error("Invalid credentials.")]
    InvalidCredentials,

    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UniqueViolation(detail) => {
                let message = if detail.contains("username") {
                    "Username already taken".to_string()
                } else if detail.contains("email") {
                    "Email already taken".to_string()
                } else {
                    detail
                };
                AppError::Conflict(message)
            }
            DbError::NotNullViolation(detail) => AppError::BadRequest(detail),
            DbError::Validation(message) => AppError::BadRequest(message),
            DbError::NotFound => AppError::NotFound,
            DbError::AuthorizationFailed => AppError::Forbidden,
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Unauthorized | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match &self {
            AppError::Internal(detail) => {
                error!("Internal error: {}", detail);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
