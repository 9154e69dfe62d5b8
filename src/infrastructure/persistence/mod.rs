//! Link repository backends and startup connection helpers.
//!
//! # Repositories
//!
//! - [`PgLinkRepository`] - PostgreSQL, unique constraint on `code`
//! - [`RedisLinkRepository`] - Redis hashes with key TTLs
//! - [`MemoryLinkRepository`] - process-local map

pub mod memory_link_repository;
pub mod pg_link_repository;
pub mod redis_link_repository;

pub use memory_link_repository::MemoryLinkRepository;
pub use pg_link_repository::{PgLinkRepository, PgPoolSettings};
pub use redis_link_repository::RedisLinkRepository;

use std::future::Future;
use std::time::Duration;
use tokio_retry::{Retry, strategy::FixedInterval};

use crate::domain::repositories::RepositoryError;

/// How often, and how far apart, startup connections are attempted.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: usize,
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 30,
            interval: Duration::from_secs(2),
        }
    }
}

/// Runs `connect` until it succeeds or `policy.attempts` are used up.
///
/// Each failed attempt is logged at `warn`. The last error is returned once
/// the attempts are exhausted.
pub async fn connect_with_retry<T, F, Fut>(
    backend: &str,
    policy: RetryPolicy,
    mut connect: F,
) -> Result<T, RepositoryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RepositoryError>>,
{
    let strategy = FixedInterval::new(policy.interval).take(policy.attempts.saturating_sub(1));
    let mut attempt = 0;

    Retry::spawn(strategy, || {
        attempt += 1;
        let current = attempt;
        let pending = connect();

        async move {
            pending.await.inspect_err(|e| {
                tracing::warn!(
                    backend,
                    attempt = current,
                    max_attempts = policy.attempts,
                    error = %e,
                    "storage connection attempt failed"
                );
            })
        }
    })
    .await
}
