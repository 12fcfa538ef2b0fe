use axum::extract::State;

use super::ApiJson;
use crate::{
    AppState,
    error::AppResult,
    models::{AuthResponse, LoginRequest, RegisterRequest},
    response::ApiResponse,
};

/// ping
///
/// Liveness probe.
#[utoipa::path(
    get,
    path = "/api/v1/ping",
    responses((status = 200, description = "Server is up"))
)]
pub async fn ping() -> ApiResponse<&'static str> {
    ApiResponse::success("pong")
}

/// register
///
/// [Public Route] Creates an account with the `user` role and returns it with
/// a freshly issued token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered", body = AuthResponse),
        (status = 400, description = "Invalid input or username/email taken")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> AppResult<ApiResponse<AuthResponse>> {
    let auth = state.users.register(payload).await?;
    Ok(ApiResponse::success(auth))
}

/// login
///
/// [Public Route] Exchanges username and password for a token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AuthResponse),
        (status = 400, description = "Invalid username or password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<ApiResponse<AuthResponse>> {
    let auth = state.users.login(payload).await?;
    Ok(ApiResponse::success(auth))
}
