//! HTTP handlers. Each one binds its input, calls a service and wraps the
//! result in the response envelope. Failures are [`AppError`]s, so every
//! answer, rejections included, carries `{ code, message }`.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

pub mod auth;
pub mod categories;
pub mod comments;
pub mod posts;
pub mod stubs;
pub mod users;

/// JSON body extractor whose rejection is an [`AppError::InvalidInput`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Path extractor whose rejection is an [`AppError::InvalidInput`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Query extractor whose rejection is an [`AppError::InvalidInput`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);
