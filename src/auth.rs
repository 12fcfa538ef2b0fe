use axum::{
    extract::{FromRef, FromRequestParts, Request},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, models::Role, token::TokenService};

/// Principal
///
/// The resolved identity of an authenticated request: the user id and role
/// read from a verified token. Handlers take it as an argument; the gate
/// below also stores it in request extensions for the role gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn is_moderator(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Moderator)
    }
}

/// Principal Extractor
///
/// Reuses the identity already attached by [`auth_gate`] when present, and
/// otherwise verifies the `Authorization` header itself. No database lookup
/// is made: the token alone is the credential.
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
    TokenService: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<Principal>() {
            return Ok(*principal);
        }

        let token = bearer_token(&parts.headers)?;
        let tokens = TokenService::from_ref(state);
        let principal = tokens.verify(token)?;

        parts.extensions.insert(principal);
        Ok(principal)
    }
}

/// bearer_token
///
/// Pulls the credential out of `Authorization: Bearer <token>`. The header is
/// split on its first space only and the scheme must match exactly.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::unauthenticated("authorization header is required"))?
        .to_str()
        .map_err(|_| AppError::unauthenticated("invalid authorization header format"))?;

    match value.split_once(' ') {
        Some(("Bearer", token)) if !token.is_empty() => Ok(token),
        _ => Err(AppError::unauthenticated(
            "invalid authorization header format",
        )),
    }
}

/// auth_gate
///
/// Middleware for every protected group. Extraction of [`Principal`] does the
/// verification; a failure short-circuits with 401 before the handler runs.
pub async fn auth_gate(principal: Principal, mut request: Request, next: Next) -> Response {
    tracing::Span::current().record("user_id", principal.user_id);
    request.extensions_mut().insert(principal);
    next.run(request).await
}

/// require_admin
///
/// Role gate for the admin group. Must run after [`auth_gate`].
pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let principal = attached_principal(&request)?;
    if !principal.is_admin() {
        return Err(AppError::forbidden("admin role required"));
    }
    Ok(next.run(request).await)
}

/// require_moderator
///
/// Role gate for moderation routes: admins and moderators pass.
pub async fn require_moderator(request: Request, next: Next) -> Result<Response, AppError> {
    let principal = attached_principal(&request)?;
    if !principal.is_moderator() {
        return Err(AppError::forbidden("moderator or admin role required"));
    }
    Ok(next.run(request).await)
}

fn attached_principal(request: &Request) -> Result<Principal, AppError> {
    request
        .extensions()
        .get::<Principal>()
        .copied()
        .ok_or_else(|| AppError::unauthenticated("authentication required"))
}
