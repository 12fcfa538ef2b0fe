use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/ping", get(handlers::auth::ping))
        // --- Auth ---
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        // --- Browsing ---
        .route("/categories", get(handlers::categories::list_categories))
        .route("/categories/{id}", get(handlers::categories::get_category))
        .route("/posts", get(handlers::posts::list_posts))
        // Static segment wins over `{id}`.
        .route("/posts/featured", get(handlers::posts::featured_posts))
        .route("/posts/{id}", get(handlers::posts::get_post))
        .route(
            "/posts/{id}/comments",
            get(handlers::comments::list_post_comments),
        )
}
