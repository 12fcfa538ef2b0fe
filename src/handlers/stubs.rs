use crate::{auth::Principal, error::AppError};

/// not_implemented
///
/// Shared handler for the like, follow and notification routes. They are
/// mounted behind the auth gate so clients see the final access rules, but
/// answer 501 until the features are built.
pub async fn not_implemented(_principal: Principal) -> AppError {
    AppError::NotImplemented
}
