//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use serde_json::json;

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its original URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Request Flow
///
/// 1. Look up the code
/// 2. Reject unknown or expired links with 404
/// 3. Hand the click update to a detached task
/// 4. Return 302 Found
///
/// The response never waits for the click counter.
///
/// # Errors
///
/// - **400** empty code
/// - **404** unknown or expired code
/// - **500** storage failure, or a stored URL that cannot be sent as `Location`
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    if code.is_empty() {
        return Err(code_required());
    }

    let long_url = state.link_service.get_long_url(&code).await?;
    let location = HeaderValue::try_from(long_url)
        .map_err(|_| AppError::internal("stored url is invalid", json!({})))?;

    // `Redirect::to` would answer 303 See Other.
    Ok((StatusCode::FOUND, [(header::LOCATION, location)]))
}

/// `GET /` has no code to resolve.
pub async fn missing_code_handler() -> AppError {
    code_required()
}

fn code_required() -> AppError {
    AppError::invalid_request("code is required", json!({}))
}
