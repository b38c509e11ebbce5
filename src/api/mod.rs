//! JSON API module.
//!
//! Read-only endpoints exposing the resolved landing content.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::content::HomeContent;
use crate::errors::{ApiError, AppError};
use crate::lifecycle::Scope;
use crate::AppState;

/// Success response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

/// Create a successful API response.
pub fn success<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(ApiResponse::new(data))
}

/// GET /api/content - Hero, gallery and testimonials as the home page shows them.
pub async fn get_content(State(state): State<AppState>) -> ApiResult<HomeContent> {
    let scope = Scope::new();
    success(HomeContent::load(&state.public, &scope).await)
}

/// Fallback for unknown API paths.
pub async fn not_found() -> ApiError {
    ApiError(AppError::NotFound("No such API endpoint".to_string()))
}
