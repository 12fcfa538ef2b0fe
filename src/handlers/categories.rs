use axum::extract::State;

use super::{ApiJson, ApiPath};
use crate::{
    AppState,
    error::AppResult,
    models::{Category, CreateCategoryRequest, UpdateCategoryRequest},
    response::ApiResponse,
};

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    responses((status = 200, description = "All categories, ordered by id", body = [Category]))
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<Category>>> {
    let categories = state.categories.list_categories().await?;
    Ok(ApiResponse::success(categories))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}",
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category", body = Category),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<Category>> {
    let category = state.categories.get_category(id).await?;
    Ok(ApiResponse::success(category))
}

/// create_category
///
/// [Admin Route] New categories start with a post count of zero.
#[utoipa::path(
    post,
    path = "/api/v1/admin/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 200, description = "Created", body = Category),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn create_category(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateCategoryRequest>,
) -> AppResult<ApiResponse<Category>> {
    let category = state.categories.create_category(payload).await?;
    Ok(ApiResponse::success(category))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/categories/{id}",
    params(("id" = i64, Path, description = "Category id")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Updated", body = Category),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<UpdateCategoryRequest>,
) -> AppResult<ApiResponse<Category>> {
    let category = state.categories.update_category(id, payload).await?;
    Ok(ApiResponse::success(category))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/categories/{id}",
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<ApiResponse<()>> {
    state.categories.delete_category(id).await?;
    Ok(ApiResponse::message("category deleted"))
}
