//! Repository trait for short link persistence.

use crate::domain::entities::{NewLink, ShortLink};
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by link repositories.
///
/// Only [`RepositoryError::Conflict`] is an expected outcome; every other
/// variant is an I/O or data failure of the backend.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("short code already exists: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
}

/// Persistence contract shared by every storage backend.
///
/// Expiration handling differs per backend: the Redis backend drops expired
/// records natively, while relational and memory backends keep them and
/// leave filtering to [`crate::application::services::LinkService`].
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL
/// - [`crate::infrastructure::persistence::RedisLinkRepository`] - Redis hashes with TTL
/// - [`crate::infrastructure::persistence::MemoryLinkRepository`] - In-process map
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Persists a new link keyed by its code.
    ///
    /// Assigns an id when `new_link.id` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Conflict`] if the code is already taken.
    /// The check and the write are atomic on every backend.
    async fn create(&self, new_link: NewLink) -> Result<ShortLink, RepositoryError>;

    /// Finds a link by its short code.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(link))` if a record exists
    /// - `Ok(None)` if not found (or already reclaimed by TTL)
    async fn find_by_code(&self, code: &str) -> Result<Option<ShortLink>, RepositoryError>;

    /// Atomically increments `click_count` and sets `last_accessed_at` to now.
    ///
    /// A missing code is not an error and leaves storage untouched.
    async fn increment_click(&self, code: &str) -> Result<(), RepositoryError>;

    /// Allocates the next value of a strictly monotonic id counter.
    async fn next_id(&self) -> Result<i64, RepositoryError>;

    /// Checks connectivity to the backend.
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// Stable backend name for logs and health output.
    fn backend(&self) -> &'static str;
}
