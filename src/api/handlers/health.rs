//! Handler for health check endpoint.

use axum::{Json, extract::State};

use crate::api::dto::health::HealthResponse;
use crate::state::AppState;

/// Reports that the process is serving requests.
///
/// # Endpoint
///
/// `GET /healthz`
///
/// # Response
///
/// ```json
/// {
///   "status": "ok",
///   "version": "0.1.0",
///   "storage": "redis"
/// }
/// ```
///
/// Always 200; storage connectivity is established at startup.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        storage: state.link_service.backend(),
    })
}
