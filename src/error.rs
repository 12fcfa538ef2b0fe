use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{password::PasswordError, response::ApiResponse, token::TokenError};

/// Result alias used across services, repositories and handlers.
pub type AppResult<T> = Result<T, AppError>;

/// AppError
///
/// The error taxonomy of the API. Every variant maps to exactly one HTTP
/// status, and every failure leaves the server inside the standard
/// `{ code, message }` envelope.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing, malformed, invalid or expired credential.
    #[error("{0}")]
    Unauthenticated(String),

    /// Authenticated, but the role tier is too low for the route.
    #[error("{0}")]
    Forbidden(String),

    /// Authenticated with a sufficient role, but not the owner of the entity.
    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidInput(String),

    /// Duplicate value for a unique field (username, email).
    #[error("{0}")]
    Conflict(String),

    /// Storage, hashing or signing failure. The message is logged, never sent.
    #[error("internal error: {0}")]
    Internal(String),

    /// The feature is routed but deliberately not built.
    #[error("not implemented")]
    NotImplemented,
}

impl AppError {
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Conflicts map to 400, not 409.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) | AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotImplemented => StatusCode::NOT_IMPLEMENTED,
        }
    }

    /// The message placed in the envelope.
    fn public_message(&self) -> String {
        match self {
            AppError::Internal(_) => "internal server error".to_string(),
            AppError::NotImplemented => "feature not implemented".to_string(),
            other => other.to_string(),
        }
    }

    fn log(&self) {
        match self {
            AppError::Internal(msg) => tracing::error!(error = %msg, "request failed"),
            AppError::Unauthenticated(msg) => tracing::debug!(reason = %msg, "unauthenticated request"),
            AppError::Forbidden(msg) | AppError::PermissionDenied(msg) => {
                tracing::warn!(reason = %msg, "access denied")
            }
            other => tracing::debug!(error = %other, "request rejected"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        ApiResponse::failure(self.status_code(), self.public_message()).into_response()
    }
}

// --- Conversions ---

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict("duplicate record".to_string())
            }
            _ => AppError::Internal(err.to_string()),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidToken(_) => AppError::Unauthenticated("invalid token".to_string()),
            TokenError::Signing(msg) => AppError::Internal(msg),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("background task failed: {err}"))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(format!("invalid parameters: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidInput(format!("invalid id: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidInput(format!("invalid query: {}", rejection.body_text()))
    }
}
