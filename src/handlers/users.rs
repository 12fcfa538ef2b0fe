use axum::extract::State;

use super::{ApiJson, ApiPath, ApiQuery};
use crate::{
    AppState,
    auth::Principal,
    error::AppResult,
    models::{
        ChangePasswordRequest, PageQuery, PostList, UpdateProfileRequest, UpdateRoleRequest,
        UserList, UserProfile,
    },
    response::ApiResponse,
};

/// get_me
///
/// [Authenticated Route] Profile of the caller.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses((status = 200, description = "Current user", body = UserProfile))
)]
pub async fn get_me(
    principal: Principal,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<UserProfile>> {
    let profile = state.users.get_user(principal.user_id).await?;
    Ok(ApiResponse::success(profile))
}

/// update_me
///
/// [Authenticated Route] Edits avatar and bio. Empty fields are kept.
#[utoipa::path(
    put,
    path = "/api/v1/users/me",
    request_body = UpdateProfileRequest,
    responses((status = 200, description = "Updated profile", body = UserProfile))
)]
pub async fn update_me(
    principal: Principal,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> AppResult<ApiResponse<UserProfile>> {
    let profile = state
        .users
        .update_profile(principal.user_id, payload)
        .await?;
    Ok(ApiResponse::success(profile))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/me/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Old password incorrect or new password too short")
    )
)]
pub async fn change_password(
    principal: Principal,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> AppResult<ApiResponse<()>> {
    state
        .users
        .change_password(principal.user_id, payload)
        .await?;
    Ok(ApiResponse::message("password changed"))
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(PageQuery),
    responses((status = 200, description = "Users", body = UserList))
)]
pub async fn list_users(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> AppResult<ApiResponse<UserList>> {
    let users = state.users.list_users(query).await?;
    Ok(ApiResponse::success(users))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserProfile),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<UserProfile>> {
    let profile = state.users.get_user(id).await?;
    Ok(ApiResponse::success(profile))
}

/// get_user_posts
///
/// [Authenticated Route] Posts written by one user, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/posts",
    params(("id" = i64, Path, description = "User id"), PageQuery),
    responses((status = 200, description = "Posts", body = PostList))
)]
pub async fn get_user_posts(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> AppResult<ApiResponse<PostList>> {
    let posts = state.posts.user_posts(id, query).await?;
    Ok(ApiResponse::success(posts))
}

/// update_user_role
///
/// [Admin Route] Changes a user's role. Takes effect on their next token.
#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{id}/role",
    params(("id" = i64, Path, description = "User id")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Updated user", body = UserProfile),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn update_user_role(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateRoleRequest>,
) -> AppResult<ApiResponse<UserProfile>> {
    let profile = state.users.update_role(id, payload.role).await?;
    Ok(ApiResponse::success(profile))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<()>> {
    state.users.delete_user(id).await?;
    Ok(ApiResponse::message("user deleted"))
}
