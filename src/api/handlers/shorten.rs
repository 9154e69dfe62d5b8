//! Handler for link shortening endpoint.

use axum::{Json, extract::State, extract::rejection::JsonRejection};

use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link for one long URL.
///
/// # Endpoint
///
/// `POST /api/v1/shorten`
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com/some/long/path",
///   "custom_code": "myLink1",
///   "expire_at": "2030-01-01T00:00:00Z"
/// }
/// ```
///
/// `custom_code` and `expire_at` are optional.
///
/// # Response
///
/// ```json
/// {
///   "code": "myLink1",
///   "short_url": "http://localhost:8080/myLink1",
///   "long_url": "https://example.com/some/long/path",
///   "expire_at": "2030-01-01T00:00:00Z"
/// }
/// ```
///
/// # Errors
///
/// - **400** invalid URL, code, expiration or malformed body
/// - **409** code already taken
/// - **500** storage failure
pub async fn shorten_handler(
    State(state): State<AppState>,
    payload: Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<Json<ShortenResponse>, AppError> {
    let Json(request) = payload?;

    let created = state
        .link_service
        .create_short_link(request.into())
        .await?;

    Ok(Json(created.into()))
}
