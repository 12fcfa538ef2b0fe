use crate::{
    AppState,
    handlers::{self, stubs::not_implemented},
};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Every route here sits behind `auth_gate`. Ownership rules for posts and
/// comments are enforced by the services using the caller's `Principal`.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Users ---
        .route(
            "/users/me",
            get(handlers::users::get_me).put(handlers::users::update_me),
        )
        .route("/users/me/password", put(handlers::users::change_password))
        .route("/users", get(handlers::users::list_users))
        .route("/users/{id}", get(handlers::users::get_user))
        .route("/users/{id}/posts", get(handlers::users::get_user_posts))
        // --- Posts ---
        .route("/posts", post(handlers::posts::create_post))
        .route(
            "/posts/{id}",
            put(handlers::posts::update_post).delete(handlers::posts::delete_post),
        )
        // --- Comments ---
        .route("/comments", post(handlers::comments::create_comment))
        .route(
            "/comments/{id}",
            put(handlers::comments::update_comment).delete(handlers::comments::delete_comment),
        )
        // --- Not built yet: likes, notifications, follows ---
        .route(
            "/posts/{id}/like",
            post(not_implemented).delete(not_implemented),
        )
        .route(
            "/comments/{id}/like",
            post(not_implemented).delete(not_implemented),
        )
        .route("/notifications", get(not_implemented))
        .route("/notifications/{id}/read", put(not_implemented))
        .route("/notifications/read-all", put(not_implemented))
        .route(
            "/follows/{id}",
            post(not_implemented).delete(not_implemented),
        )
        .route("/follows/followers", get(not_implemented))
        .route("/follows/following", get(not_implemented))
}
