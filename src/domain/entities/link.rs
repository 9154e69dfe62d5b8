//! Short link entity.

use chrono::{DateTime, Utc};

/// A stored binding between a short code and a long URL, with usage counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortLink {
    pub id: i64,
    pub code: String,
    pub long_url: String,
    pub created_at: DateTime<Utc>,
    pub expire_at: Option<DateTime<Utc>>,
    pub click_count: i64,
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl ShortLink {
    /// Returns true if the link's expiration instant is at or before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expire_at.is_some_and(|expire_at| expire_at <= now)
    }

    /// Returns true if the link has passed its expiration instant.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Input data for persisting a new link.
///
/// `id` may be pre-allocated through
/// [`LinkRepository::next_id`](crate::domain::repositories::LinkRepository::next_id);
/// when `None` the backend assigns one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLink {
    pub id: Option<i64>,
    pub code: String,
    pub long_url: String,
    pub created_at: DateTime<Utc>,
    pub expire_at: Option<DateTime<Utc>>,
}

impl NewLink {
    /// Builds the stored representation once the backend has settled on an id.
    ///
    /// New links start with no clicks and no last access.
    pub fn into_link(self, id: i64) -> ShortLink {
        ShortLink {
            id,
            code: self.code,
            long_url: self.long_url,
            created_at: self.created_at,
            expire_at: self.expire_at,
            click_count: 0,
            last_accessed_at: None,
        }
    }
}
