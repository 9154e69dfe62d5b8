//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{code}`       - Short link redirect
//! - `GET  /`             - 400, no code given
//! - `GET  /healthz`      - Liveness and storage backend name
//! - `/api/v1/*`          - JSON API
//!
//! # Middleware
//!
//! - **CORS** - Permissive headers on every response, `OPTIONS` answered with 204
//! - **Tracing** - Structured request/response logging

use crate::api;
use crate::api::handlers::{health_handler, missing_code_handler, redirect_handler};
use crate::api::middleware::{cors, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};

/// Constructs the application router with all routes and middleware.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(missing_code_handler))
        .route("/{code}", get(redirect_handler))
        .route("/healthz", get(health_handler))
        .nest("/api/v1", api::routes::v1_routes())
        .with_state(state)
        .layer(middleware::from_fn(cors::layer))
        .layer(tracing::layer())
}
