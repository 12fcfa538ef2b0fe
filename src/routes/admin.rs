use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{post, put},
};

/// Admin Router Module
///
/// Category and user management. Wrapped in `require_admin`.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", post(handlers::categories::create_category))
        .route(
            "/categories/{id}",
            put(handlers::categories::update_category)
                .delete(handlers::categories::delete_category),
        )
        .route("/users/{id}/role", put(handlers::users::update_user_role))
        .route(
            "/users/{id}",
            axum::routing::delete(handlers::users::delete_user),
        )
}

/// Moderation Router Module
///
/// Pin and feature toggles. Wrapped in `require_moderator`, so moderators
/// and admins both pass.
pub fn moderation_routes() -> Router<AppState> {
    Router::new()
        .route("/posts/{id}/pin", put(handlers::posts::pin_post))
        .route("/posts/{id}/unpin", put(handlers::posts::unpin_post))
        .route("/posts/{id}/feature", put(handlers::posts::feature_post))
        .route("/posts/{id}/unfeature", put(handlers::posts::unfeature_post))
}
