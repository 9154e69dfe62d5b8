//! DTOs for health check endpoint.

use serde::Serialize;

/// Liveness response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// Name of the storage backend serving links.
    pub storage: &'static str,
}
