//! Handler for link inspection.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::dto::link_info::LinkInfoResponse;
use crate::error::AppError;
use crate::state::AppState;

/// Returns a link with its click statistics.
///
/// # Endpoint
///
/// `GET /api/v1/links/{code}`
///
/// Does not count as a click. Expired links stay readable as long as the
/// storage backend still holds them.
///
/// # Errors
///
/// - **404** unknown code
/// - **500** storage failure
pub async fn link_info_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<LinkInfoResponse>, AppError> {
    let link = state.link_service.get_link_info(&code).await?;
    Ok(Json(link.into()))
}
