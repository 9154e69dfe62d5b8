//! # shortlink
//!
//! A URL shortening service built with Axum, storing links in PostgreSQL,
//! Redis or process memory.
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture principles with clear layer separation:
//!
//! - **Domain Layer** ([`domain`]) - Link entity and the storage contract
//! - **Application Layer** ([`application`]) - Link creation, resolution and inspection
//! - **Infrastructure Layer** ([`infrastructure`]) - Storage backends
//! - **API Layer** ([`api`]) - REST handlers, DTOs and middleware
//!
//! ## Features
//!
//! - Random or id-derived base-62 short codes, with caller-chosen custom codes
//! - Optional expiration per link (native key TTL on Redis)
//! - Click counter and last access time, updated off the redirect path
//! - Interchangeable storage backends selected at startup
//!
//! ## Quick Start
//!
//! ```bash
//! export STORAGE_BACKEND=redis
//! export REDIS_ADDR="localhost:6379"
//! export BASE_URL="http://localhost:8080"
//!
//! cargo run
//! ```
//!
//! ## Configuration
//!
//! Service configuration is loaded from environment variables via [`config::Config`].
//! See [`config`] module for available options.

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod state;
pub mod utils;

pub mod config;
pub mod server;

pub mod routes;

pub use error::AppError;
pub use state::AppState;

/// Commonly used types for external consumers.
///
/// Re-exports frequently used types to simplify imports for library users
/// and integration tests.
pub mod prelude {
    pub use crate::application::services::{CodeStrategy, CreateLinkRequest, LinkService};
    pub use crate::domain::entities::{NewLink, ShortLink};
    pub use crate::domain::repositories::{LinkRepository, RepositoryError};
    pub use crate::error::AppError;
    pub use crate::infrastructure::persistence::MemoryLinkRepository;
    pub use crate::routes::app_router;
    pub use crate::state::AppState;
}
