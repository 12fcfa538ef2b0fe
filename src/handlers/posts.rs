use axum::extract::State;

use super::{ApiJson, ApiPath, ApiQuery};
use crate::{
    AppState,
    auth::Principal,
    error::AppResult,
    models::{CreatePostRequest, Post, PostList, PostListQuery, UpdatePostRequest},
    response::ApiResponse,
};

/// list_posts
///
/// [Public Route] Paged listing. Pinned posts lead each page; `order_by`
/// is `latest` (default) or `popular`.
#[utoipa::path(
    get,
    path = "/api/v1/posts",
    params(PostListQuery),
    responses((status = 200, description = "Posts", body = PostList))
)]
pub async fn list_posts(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PostListQuery>,
) -> AppResult<ApiResponse<PostList>> {
    let posts = state.posts.list_posts(query).await?;
    Ok(ApiResponse::success(posts))
}

#[utoipa::path(
    get,
    path = "/api/v1/posts/featured",
    responses((status = 200, description = "Featured posts", body = [Post]))
)]
pub async fn featured_posts(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<Post>>> {
    let posts = state.posts.featured_posts().await?;
    Ok(ApiResponse::success(posts))
}

/// get_post
///
/// [Public Route] Post detail with author and category names. The view is
/// queued for the counter worker; the returned `view_count` does not include
/// it yet.
#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}",
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post", body = Post),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_post(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<Post>> {
    let post = state.posts.get_post(id).await?;
    state.views.record(post.id);
    Ok(ApiResponse::success(post))
}

/// create_post
///
/// [Authenticated Route] The caller becomes the owner. Filing under a
/// category increments that category's post count.
#[utoipa::path(
    post,
    path = "/api/v1/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 200, description = "Created", body = Post),
        (status = 404, description = "Category not found")
    )
)]
pub async fn create_post(
    principal: Principal,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreatePostRequest>,
) -> AppResult<ApiResponse<Post>> {
    let post = state.posts.create_post(principal.user_id, payload).await?;
    Ok(ApiResponse::success(post))
}

/// update_post
///
/// [Authenticated Route] Owner only. Admins cannot edit other users' posts.
#[utoipa::path(
    put,
    path = "/api/v1/posts/{id}",
    params(("id" = i64, Path, description = "Post id")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Updated", body = Post),
        (status = 403, description = "Not Owner"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_post(
    principal: Principal,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdatePostRequest>,
) -> AppResult<ApiResponse<Post>> {
    let post = state
        .posts
        .update_post(id, principal.user_id, payload)
        .await?;
    Ok(ApiResponse::success(post))
}

/// delete_post
///
/// [Authenticated Route] Owner or admin.
#[utoipa::path(
    delete,
    path = "/api/v1/posts/{id}",
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 403, description = "Not Owner"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_post(
    principal: Principal,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<()>> {
    state
        .posts
        .delete_post(id, principal.user_id, principal.is_admin())
        .await?;
    Ok(ApiResponse::message("post deleted"))
}

// --- Moderation (admin or moderator) ---

#[utoipa::path(
    put,
    path = "/api/v1/admin/posts/{id}/pin",
    params(("id" = i64, Path, description = "Post id")),
    responses((status = 200, description = "Pinned", body = Post))
)]
pub async fn pin_post(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<Post>> {
    Ok(ApiResponse::success(state.posts.set_pinned(id, true).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/posts/{id}/unpin",
    params(("id" = i64, Path, description = "Post id")),
    responses((status = 200, description = "Unpinned", body = Post))
)]
pub async fn unpin_post(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<Post>> {
    Ok(ApiResponse::success(state.posts.set_pinned(id, false).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/posts/{id}/feature",
    params(("id" = i64, Path, description = "Post id")),
    responses((status = 200, description = "Featured", body = Post))
)]
pub async fn feature_post(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<Post>> {
    Ok(ApiResponse::success(state.posts.set_featured(id, true).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/posts/{id}/unfeature",
    params(("id" = i64, Path, description = "Post id")),
    responses((status = 200, description = "No longer featured", body = Post))
)]
pub async fn unfeature_post(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<Post>> {
    Ok(ApiResponse::success(state.posts.set_featured(id, false).await?))
}
