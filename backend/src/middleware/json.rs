//! JSON body extractor whose rejections use the API error shape

use axum::extract::FromRequest;

use crate::error::AppError;

/// `axum::Json` with rejections rendered as 400 `BAD_REQUEST` instead of
/// axum's plain-text 415/422 responses
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
