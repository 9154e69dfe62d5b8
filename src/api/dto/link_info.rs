//! DTO for link inspection endpoint.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::ShortLink;

/// Public projection of a stored link with its usage counters.
///
/// The internal `id` is not exposed.
#[derive(Debug, Serialize)]
pub struct LinkInfoResponse {
    pub code: String,
    pub long_url: String,
    pub created_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_at: Option<DateTime<Utc>>,

    pub click_count: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl From<ShortLink> for LinkInfoResponse {
    fn from(link: ShortLink) -> Self {
        Self {
            code: link.code,
            long_url: link.long_url,
            created_at: link.created_at,
            expire_at: link.expire_at,
            click_count: link.click_count,
            last_accessed_at: link.last_accessed_at,
        }
    }
}
