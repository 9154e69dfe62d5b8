//! Redis implementation of the link repository.
//!
//! # Key layout
//!
//! - `shortener:next_id` - integer counter behind [`LinkRepository::next_id`]
//! - `shortener:link:{code}` - hash with fields `id`, `code`, `long_url`,
//!   `created_at`, `expire_at`, `click_count`, `last_accessed_at`
//!
//! Instants are RFC 3339 strings in UTC with nanosecond precision; absent
//! optional fields are stored as the empty string. Links with an expiration
//! get a key TTL so Redis reclaims them on its own.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use redis::{AsyncCommands, Client, Script, aio::ConnectionManager};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{info, warn};

use crate::domain::entities::{NewLink, ShortLink};
use crate::domain::repositories::{LinkRepository, RepositoryError};

const NEXT_ID_KEY: &str = "shortener:next_id";
const LINK_KEY_PREFIX: &str = "shortener:link:";

/// Writes the hash only if the key does not exist, then applies the TTL.
///
/// KEYS[1] = link key; ARGV = id, code, long_url, created_at, expire_at, ttl_ms.
/// Returns 1 when written, 0 when the code is taken.
static CREATE_SCRIPT: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r#"
        if redis.call('EXISTS', KEYS[1]) == 1 then
            return 0
        end
        redis.call('HSET', KEYS[1],
            'id', ARGV[1],
            'code', ARGV[2],
            'long_url', ARGV[3],
            'created_at', ARGV[4],
            'expire_at', ARGV[5],
            'click_count', '0',
            'last_accessed_at', '')
        local ttl = tonumber(ARGV[6])
        if ttl > 0 then
            redis.call('PEXPIRE', KEYS[1], ttl)
        end
        return 1
        "#,
    )
});

/// Bumps the counter and access time of an existing hash.
///
/// The `EXISTS` guard keeps an expired key from being recreated.
/// KEYS[1] = link key; ARGV[1] = access instant.
static INCREMENT_SCRIPT: LazyLock<Script> = LazyLock::new(|| {
    Script::new(
        r#"
        if redis.call('EXISTS', KEYS[1]) == 0 then
            return 0
        end
        redis.call('HINCRBY', KEYS[1], 'click_count', 1)
        redis.call('HSET', KEYS[1], 'last_accessed_at', ARGV[1])
        return 1
        "#,
    )
});

/// Redis-backed link repository.
///
/// Uses a `ConnectionManager`, which reconnects transparently and is cheap
/// to clone per operation.
pub struct RedisLinkRepository {
    conn: ConnectionManager,
}

impl RedisLinkRepository {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Redis`] if the URL is invalid, the connection
    /// cannot be established, or the PING fails.
    pub async fn connect(redis_url: &str) -> Result<Self, RepositoryError> {
        let client = Client::open(redis_url)?;
        let manager = ConnectionManager::new(client).await?;

        let repository = Self::new(manager);
        repository.ping().await?;

        info!("Connected to Redis");
        Ok(repository)
    }
}

fn link_key(code: &str) -> String {
    format!("{}{}", LINK_KEY_PREFIX, code)
}

fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    if value.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|instant| instant.with_timezone(&Utc))
}

/// Milliseconds until `expire_at`, or 0 for no TTL.
///
/// An instant already reached still gets the smallest TTL so the key never
/// outlives its expiration.
fn ttl_millis(expire_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    match expire_at {
        Some(expire_at) => (expire_at - now).num_milliseconds().max(1),
        None => 0,
    }
}

/// Rebuilds a link from its hash fields.
///
/// Returns `None` for an empty hash or one missing `code`/`long_url`.
/// Malformed numeric and optional instant fields are read as unset.
fn link_from_hash(mut fields: HashMap<String, String>) -> Option<ShortLink> {
    let code = fields.remove("code").filter(|v| !v.is_empty())?;
    let long_url = fields.remove("long_url").filter(|v| !v.is_empty())?;

    let field = |name: &str| fields.get(name).map(String::as_str).unwrap_or_default();

    let created_at = parse_instant(field("created_at")).unwrap_or_else(|| {
        warn!(code = %code, "link hash has no valid created_at");
        DateTime::UNIX_EPOCH
    });

    Some(ShortLink {
        id: field("id").parse().unwrap_or_default(),
        code,
        long_url,
        created_at,
        expire_at: parse_instant(field("expire_at")),
        click_count: field("click_count").parse().unwrap_or_default(),
        last_accessed_at: parse_instant(field("last_accessed_at")),
    })
}

#[async_trait]
impl LinkRepository for RedisLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<ShortLink, RepositoryError> {
        let id = match new_link.id {
            Some(id) => id,
            None => self.next_id().await?,
        };

        let key = link_key(&new_link.code);
        let expire_at = new_link.expire_at.map(format_instant).unwrap_or_default();
        let ttl = ttl_millis(new_link.expire_at, Utc::now());

        let mut conn = self.conn.clone();
        let written: i64 = CREATE_SCRIPT
            .key(&key)
            .arg(id)
            .arg(&new_link.code)
            .arg(&new_link.long_url)
            .arg(format_instant(new_link.created_at))
            .arg(expire_at)
            .arg(ttl)
            .invoke_async(&mut conn)
            .await?;

        if written == 0 {
            return Err(RepositoryError::Conflict(new_link.code));
        }

        Ok(new_link.into_link(id))
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<ShortLink>, RepositoryError> {
        let mut conn = self.conn.clone();
        let fields: HashMap<String, String> = conn.hgetall(link_key(code)).await?;

        Ok(link_from_hash(fields))
    }

    async fn increment_click(&self, code: &str) -> Result<(), RepositoryError> {
        let mut conn = self.conn.clone();
        let _: i64 = INCREMENT_SCRIPT
            .key(link_key(code))
            .arg(format_instant(Utc::now()))
            .invoke_async(&mut conn)
            .await?;

        Ok(())
    }

    async fn next_id(&self) -> Result<i64, RepositoryError> {
        let mut conn = self.conn.clone();
        let id: i64 = conn.incr(NEXT_ID_KEY, 1).await?;
        Ok(id)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        let mut conn = self.conn.clone();
        conn.ping::<()>().await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn hash(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_link_key_format() {
        assert_eq!(link_key("abc123"), "shortener:link:abc123");
    }

    #[test]
    fn test_instant_format_has_nanoseconds_in_utc() {
        let instant = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
            + Duration::nanoseconds(123_456_789);

        let formatted = format_instant(instant);

        assert_eq!(formatted, "2024-05-01T12:30:00.123456789Z");
        assert_eq!(parse_instant(&formatted), Some(instant));
    }

    #[test]
    fn test_parse_instant_accepts_offsets_and_rejects_garbage() {
        let parsed = parse_instant("2024-05-01T14:30:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap());

        assert_eq!(parse_instant(""), None);
        assert_eq!(parse_instant("yesterday"), None);
    }

    #[test]
    fn test_ttl_millis() {
        let now = Utc::now();

        assert_eq!(ttl_millis(None, now), 0);
        assert_eq!(ttl_millis(Some(now + Duration::seconds(2)), now), 2000);
        assert_eq!(ttl_millis(Some(now - Duration::seconds(5)), now), 1);
        assert_eq!(ttl_millis(Some(now), now), 1);
    }

    #[test]
    fn test_link_from_hash_full_record() {
        let link = link_from_hash(hash(&[
            ("id", "17"),
            ("code", "abcdef"),
            ("long_url", "https://example.com"),
            ("created_at", "2024-05-01T12:00:00.000000001Z"),
            ("expire_at", "2024-06-01T12:00:00Z"),
            ("click_count", "5"),
            ("last_accessed_at", "2024-05-02T08:00:00Z"),
        ]))
        .unwrap();

        assert_eq!(link.id, 17);
        assert_eq!(link.code, "abcdef");
        assert_eq!(link.long_url, "https://example.com");
        assert_eq!(link.click_count, 5);
        assert_eq!(
            link.expire_at,
            Some(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
        );
        assert_eq!(
            link.last_accessed_at,
            Some(Utc.with_ymd_and_hms(2024, 5, 2, 8, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_link_from_hash_empty_is_absent() {
        assert!(link_from_hash(HashMap::new()).is_none());
    }

    #[test]
    fn test_link_from_hash_partial_hash_is_absent() {
        let fields = hash(&[("click_count", "1"), ("last_accessed_at", "2024-05-02T08:00:00Z")]);
        assert!(link_from_hash(fields).is_none());
    }

    #[test]
    fn test_link_from_hash_tolerates_malformed_fields() {
        let link = link_from_hash(hash(&[
            ("id", "not-a-number"),
            ("code", "abcdef"),
            ("long_url", "https://example.com"),
            ("created_at", "2024-05-01T12:00:00Z"),
            ("expire_at", "soon"),
            ("click_count", ""),
            ("last_accessed_at", ""),
        ]))
        .unwrap();

        assert_eq!(link.id, 0);
        assert_eq!(link.click_count, 0);
        assert!(link.expire_at.is_none());
        assert!(link.last_accessed_at.is_none());
    }
}
