//! API route configuration.

use crate::api::handlers::{link_info_handler, shorten_handler};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Versioned JSON API, mounted under `/api/v1`.
///
/// # Endpoints
///
/// - `POST /shorten`       - Create a short link
/// - `GET  /links/{code}`  - Link details and click statistics
pub fn v1_routes() -> Router<AppState> {
    Router::new()
        .route("/shorten", post(shorten_handler))
        .route("/links/{code}", get(link_info_handler))
}
