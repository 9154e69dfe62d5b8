//! DTOs for link shortening endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::services::{CreateLinkRequest, CreatedLink};

/// Request to shorten a single URL.
///
/// A missing `url` deserializes as empty and is rejected by validation with
/// the same error as an explicit `""`.
#[derive(Debug, Deserialize)]
pub struct ShortenRequest {
    #[serde(default)]
    pub url: String,

    /// Optional caller-chosen code; empty means "generate one".
    #[serde(default)]
    pub custom_code: Option<String>,

    /// Optional RFC 3339 expiration instant, must be in the future.
    #[serde(default)]
    pub expire_at: Option<DateTime<Utc>>,
}

impl From<ShortenRequest> for CreateLinkRequest {
    fn from(request: ShortenRequest) -> Self {
        Self {
            url: request.url,
            custom_code: request.custom_code,
            expire_at: request.expire_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ShortenResponse {
    pub code: String,
    pub short_url: String,
    pub long_url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_at: Option<DateTime<Utc>>,
}

impl From<CreatedLink> for ShortenResponse {
    fn from(link: CreatedLink) -> Self {
        Self {
            code: link.code,
            short_url: link.short_url,
            long_url: link.long_url,
            expire_at: link.expire_at,
        }
    }
}
