//! PostgreSQL implementation of the link repository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::entities::{NewLink, ShortLink};
use crate::domain::repositories::{LinkRepository, RepositoryError};

/// Name of the unique constraint guarding `short_links.code`.
const CODE_UNIQUE_CONSTRAINT: &str = "short_links_code_key";

/// Connection pool sizing for [`PgLinkRepository::connect`].
#[derive(Debug, Clone)]
pub struct PgPoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime: Duration,
    pub acquire_timeout: Duration,
}

impl Default for PgPoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 25,
            min_connections: 5,
            max_lifetime: Duration::from_secs(300),
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

/// PostgreSQL repository for short links.
///
/// Expired rows are kept; filtering happens in the service. The unique
/// constraint on `code` makes concurrent inserts of one code yield a single
/// winner and a [`RepositoryError::Conflict`] for the rest.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Opens a bounded connection pool and verifies it with a round trip.
    pub async fn connect(
        database_url: &str,
        settings: &PgPoolSettings,
    ) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .max_lifetime(settings.max_lifetime)
            .acquire_timeout(settings.acquire_timeout)
            .connect(database_url)
            .await?;

        Ok(Self::new(Arc::new(pool)))
    }

    /// Creates the `short_links` table and its indexes if missing.
    ///
    /// Safe to run on every startup.
    pub async fn init_schema(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("./migrations").run(self.pool.as_ref()).await?;
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn is_unique_violation_on_code(e: &sqlx::Error) -> bool {
    let Some(db_err) = e.as_database_error() else {
        return false;
    };

    if !db_err.is_unique_violation() {
        return false;
    }

    matches!(db_err.constraint(), Some(CODE_UNIQUE_CONSTRAINT))
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<ShortLink, RepositoryError> {
        let result = sqlx::query_as!(
            ShortLink,
            r#"
            INSERT INTO short_links (id, code, long_url, created_at, expire_at)
            VALUES (COALESCE($1, nextval(pg_get_serial_sequence('short_links', 'id'))), $2, $3, $4, $5)
            RETURNING
                id AS "id!",
                code AS "code!",
                long_url AS "long_url!",
                created_at AS "created_at!",
                expire_at,
                click_count AS "click_count!",
                last_accessed_at
            "#,
            new_link.id,
            new_link.code,
            new_link.long_url,
            new_link.created_at,
            new_link.expire_at
        )
        .fetch_one(self.pool.as_ref())
        .await;

        match result {
            Ok(link) => Ok(link),
            Err(e) if is_unique_violation_on_code(&e) => Err(RepositoryError::Conflict(new_link.code)),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<ShortLink>, RepositoryError> {
        let link = sqlx::query_as!(
            ShortLink,
            r#"
            SELECT id, code, long_url, created_at, expire_at, click_count, last_accessed_at
            FROM short_links
            WHERE code = $1
            "#,
            code
        )
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(link)
    }

    async fn increment_click(&self, code: &str) -> Result<(), RepositoryError> {
        sqlx::query!(
            r#"
            UPDATE short_links
            SET click_count = click_count + 1,
                last_accessed_at = $2
            WHERE code = $1
            "#,
            code,
            Utc::now()
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn next_id(&self) -> Result<i64, RepositoryError> {
        let id = sqlx::query_scalar!(
            r#"SELECT nextval(pg_get_serial_sequence('short_links', 'id')) AS "id!""#
        )
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(id)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
