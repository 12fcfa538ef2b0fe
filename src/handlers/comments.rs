use axum::extract::State;

use super::{ApiJson, ApiPath, ApiQuery};
use crate::{
    AppState,
    auth::Principal,
    error::AppResult,
    models::{Comment, CommentList, CreateCommentRequest, PageQuery, UpdateCommentRequest},
    response::ApiResponse,
};

/// list_post_comments
///
/// [Public Route] Top-level comments of a post with their replies.
#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}/comments",
    params(("id" = i64, Path, description = "Post id"), PageQuery),
    responses(
        (status = 200, description = "Comment threads", body = CommentList),
        (status = 404, description = "Post not found")
    )
)]
pub async fn list_post_comments(
    State(state): State<AppState>,
    ApiPath(post_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> AppResult<ApiResponse<CommentList>> {
    let comments = state.comments.list_post_comments(post_id, query).await?;
    Ok(ApiResponse::success(comments))
}

#[utoipa::path(
    post,
    path = "/api/v1/comments",
    request_body = CreateCommentRequest,
    responses(
        (status = 200, description = "Created", body = Comment),
        (status = 400, description = "Empty content or bad parent"),
        (status = 404, description = "Post not found")
    )
)]
pub async fn create_comment(
    principal: Principal,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateCommentRequest>,
) -> AppResult<ApiResponse<Comment>> {
    let comment = state
        .comments
        .create_comment(principal.user_id, payload)
        .await?;
    Ok(ApiResponse::success(comment))
}

#[utoipa::path(
    put,
    path = "/api/v1/comments/{id}",
    params(("id" = i64, Path, description = "Comment id")),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Updated", body = Comment),
        (status = 403, description = "Not Owner")
    )
)]
pub async fn update_comment(
    principal: Principal,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateCommentRequest>,
) -> AppResult<ApiResponse<Comment>> {
    let comment = state
        .comments
        .update_comment(id, principal.user_id, payload)
        .await?;
    Ok(ApiResponse::success(comment))
}

#[utoipa::path(
    delete,
    path = "/api/v1/comments/{id}",
    params(("id" = i64, Path, description = "Comment id")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 403, description = "Not Owner")
    )
)]
pub async fn delete_comment(
    principal: Principal,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<()>> {
    state
        .comments
        .delete_comment(id, principal.user_id, principal.is_admin())
        .await?;
    Ok(ApiResponse::message("comment deleted"))
}
