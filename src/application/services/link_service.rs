//! Link creation, resolution and inspection.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, error};

use crate::domain::entities::{NewLink, ShortLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::code_generator::{generate_code_from_id, generate_random_code};
use crate::utils::validator::{validate_code, validate_url};

/// Attempts made to find a free generated code before giving up.
const MAX_CODE_ATTEMPTS: usize = 10;

/// Default length of randomly generated codes.
pub const DEFAULT_CODE_LENGTH: usize = 8;

/// Default upper bound for the detached click counter update.
pub const DEFAULT_CLICK_UPDATE_TIMEOUT: Duration = Duration::from_secs(5);

/// How codes are produced when the caller does not supply one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodeStrategy {
    /// Cryptographically random code, probed for uniqueness.
    #[default]
    Random,
    /// Base-62 code derived from the repository's id counter.
    Sequential,
}

impl FromStr for CodeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "sequential" => Ok(Self::Sequential),
            other => Err(format!(
                "unknown code strategy '{}', expected 'random' or 'sequential'",
                other
            )),
        }
    }
}

/// Input for [`LinkService::create_short_link`].
#[derive(Debug, Clone, Default)]
pub struct CreateLinkRequest {
    pub url: String,
    pub custom_code: Option<String>,
    pub expire_at: Option<DateTime<Utc>>,
}

/// Result of a successful [`LinkService::create_short_link`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedLink {
    pub code: String,
    pub short_url: String,
    pub long_url: String,
    pub expire_at: Option<DateTime<Utc>>,
}

/// Service orchestrating validation, code selection and storage of links.
///
/// Works against any [`LinkRepository`] backend chosen at startup.
pub struct LinkService {
    repository: Arc<dyn LinkRepository>,
    base_url: String,
    code_strategy: CodeStrategy,
    code_length: usize,
    click_update_timeout: Duration,
}

impl LinkService {
    /// Creates a link service using random codes of [`DEFAULT_CODE_LENGTH`].
    ///
    /// A trailing `/` on `base_url` is ignored.
    pub fn new(repository: Arc<dyn LinkRepository>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            repository,
            base_url,
            code_strategy: CodeStrategy::default(),
            code_length: DEFAULT_CODE_LENGTH,
            click_update_timeout: DEFAULT_CLICK_UPDATE_TIMEOUT,
        }
    }

    /// Selects the code generation strategy and the random code length.
    pub fn with_code_strategy(mut self, strategy: CodeStrategy, code_length: usize) -> Self {
        self.code_strategy = strategy;
        self.code_length = code_length;
        self
    }

    /// Bounds how long a detached click counter update may run.
    pub fn with_click_update_timeout(mut self, timeout: Duration) -> Self {
        self.click_update_timeout = timeout;
        self
    }

    /// Name of the storage backend in use.
    pub fn backend(&self) -> &'static str {
        self.repository.backend()
    }

    /// Builds the public short URL for a code.
    pub fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.base_url, code)
    }

    /// Creates a short link.
    ///
    /// # Flow
    ///
    /// 1. Validate the long URL
    /// 2. Use the custom code if given (validated, must be unused), otherwise
    ///    generate one with up to 10 collision retries
    /// 3. Reject an `expire_at` that is not in the future
    /// 4. Persist with `created_at = now`
    ///
    /// An empty `custom_code` counts as absent.
    ///
    /// # Errors
    ///
    /// - [`AppError::InvalidRequest`] for invalid URL, code or expiration
    /// - [`AppError::Conflict`] if the code is already taken
    /// - [`AppError::Internal`] on storage failures or exhausted code generation
    pub async fn create_short_link(
        &self,
        request: CreateLinkRequest,
    ) -> Result<CreatedLink, AppError> {
        validate_url(&request.url)?;

        let custom_code = request.custom_code.filter(|code| !code.is_empty());

        let (id, code) = if let Some(custom) = custom_code {
            validate_code(&custom)?;

            if self.repository.find_by_code(&custom).await?.is_some() {
                return Err(AppError::conflict(
                    "custom code already exists",
                    json!({ "code": custom }),
                ));
            }

            (None, custom)
        } else {
            self.generate_unique_code().await?
        };

        let now = Utc::now();
        if request.expire_at.is_some_and(|expire_at| expire_at <= now) {
            return Err(AppError::invalid_request(
                "expire_at must be in the future",
                json!({ "reason": "expire_at_in_past" }),
            ));
        }

        let new_link = NewLink {
            id,
            code,
            long_url: request.url,
            created_at: now,
            expire_at: request.expire_at,
        };

        let link = self.repository.create(new_link).await?;
        debug!(code = %link.code, id = link.id, "short link created");

        Ok(CreatedLink {
            short_url: self.short_url(&link.code),
            code: link.code,
            long_url: link.long_url,
            expire_at: link.expire_at,
        })
    }

    /// Resolves a code to its long URL for redirection.
    ///
    /// On success the click counter is updated by a detached task; the caller
    /// never waits for it and its failures are discarded. Only a stored URL
    /// that still passes [`validate_url`] is returned, so every counted click
    /// is a redirect that can be served.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] if the code is unknown or expired
    /// - [`AppError::Internal`] on storage failures or an unusable stored URL
    pub async fn get_long_url(&self, code: &str) -> Result<String, AppError> {
        let link = self
            .repository
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::not_found("short link not found", json!({})))?;

        if link.is_expired() {
            return Err(AppError::not_found("short link expired", json!({})));
        }

        if let Err(e) = validate_url(&link.long_url) {
            error!(code = %link.code, reason = e.reason(), "stored url cannot be redirected");
            return Err(AppError::internal("stored url is invalid", json!({})));
        }

        self.record_click(link.code);

        Ok(link.long_url)
    }

    /// Returns the stored record for a code, including click statistics.
    ///
    /// Expiry is not enforced here: an expired record that the backend still
    /// holds remains readable.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] if the code is unknown
    /// - [`AppError::Internal`] on storage failures
    pub async fn get_link_info(&self, code: &str) -> Result<ShortLink, AppError> {
        self.repository
            .find_by_code(code)
            .await?
            .ok_or_else(|| AppError::not_found("short link not found", json!({})))
    }

    /// Spawns the click counter update.
    ///
    /// `tokio::spawn` detaches the task from the request future, so a client
    /// disconnect that drops the handler does not cancel the update.
    fn record_click(&self, code: String) {
        let repository = Arc::clone(&self.repository);
        let timeout = self.click_update_timeout;

        tokio::spawn(async move {
            match tokio::time::timeout(timeout, repository.increment_click(&code)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => debug!(code = %code, error = %e, "click update failed"),
                Err(_) => debug!(code = %code, "click update timed out"),
            }
        });
    }

    /// Produces a code that is currently unused, with its pre-allocated id if any.
    async fn generate_unique_code(&self) -> Result<(Option<i64>, String), AppError> {
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let (id, code) = match self.code_strategy {
                CodeStrategy::Random => (None, generate_random_code(self.code_length)),
                CodeStrategy::Sequential => {
                    let id = self.repository.next_id().await?;
                    let code = u64::try_from(id).map(generate_code_from_id).map_err(|_| {
                        error!(id, "id counter returned a negative value");
                        AppError::internal("failed to generate code", json!({}))
                    })?;
                    (Some(id), code)
                }
            };

            if self.repository.find_by_code(&code).await?.is_none() {
                return Ok((id, code));
            }

            debug!(attempt, code = %code, "generated code already taken");
        }

        Err(AppError::internal(
            "failed to generate unique code",
            json!({ "reason": "too many collisions" }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::{MockLinkRepository, RepositoryError};
    use crate::utils::validator::validate_code;
    use chrono::Duration as ChronoDuration;
    use tokio::sync::mpsc;

    const BASE_URL: &str = "http://localhost:8080";

    fn stored_link(code: &str, url: &str, expire_at: Option<DateTime<Utc>>) -> ShortLink {
        ShortLink {
            id: 1,
            code: code.to_string(),
            long_url: url.to_string(),
            created_at: Utc::now() - ChronoDuration::hours(1),
            expire_at,
            click_count: 0,
            last_accessed_at: None,
        }
    }

    fn service(repo: MockLinkRepository) -> LinkService {
        LinkService::new(Arc::new(repo), BASE_URL)
    }

    fn request(url: &str, custom_code: Option<&str>) -> CreateLinkRequest {
        CreateLinkRequest {
            url: url.to_string(),
            custom_code: custom_code.map(str::to_string),
            expire_at: None,
        }
    }

    #[tokio::test]
    async fn test_create_short_link_generated_code() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code().times(1).returning(|_| Ok(None));
        repo.expect_create()
            .withf(|new_link| new_link.id.is_none() && new_link.long_url == "https://example.com/a")
            .times(1)
            .returning(|new_link| Ok(new_link.into_link(42)));

        let created = service(repo)
            .create_short_link(request("https://example.com/a", None))
            .await
            .unwrap();

        assert_eq!(created.code.len(), DEFAULT_CODE_LENGTH);
        assert!(validate_code(&created.code).is_ok());
        assert_eq!(created.short_url, format!("{}/{}", BASE_URL, created.code));
        assert_eq!(created.long_url, "https://example.com/a");
        assert!(created.expire_at.is_none());
    }

    #[tokio::test]
    async fn test_create_short_link_sets_creation_fields() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code().returning(|_| Ok(None));

        let before = Utc::now();
        repo.expect_create()
            .withf(move |new_link| new_link.created_at >= before)
            .times(1)
            .returning(|new_link| Ok(new_link.into_link(1)));

        let result = service(repo)
            .create_short_link(request("https://example.com", None))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_create_short_link_with_custom_code() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code()
            .withf(|code| code == "abcdef")
            .times(1)
            .returning(|_| Ok(None));
        repo.expect_create()
            .withf(|new_link| new_link.code == "abcdef")
            .times(1)
            .returning(|new_link| Ok(new_link.into_link(1)));

        let created = service(repo)
            .create_short_link(request("https://x.test", Some("abcdef")))
            .await
            .unwrap();

        assert_eq!(created.code, "abcdef");
        assert_eq!(created.short_url, "http://localhost:8080/abcdef");
    }

    #[tokio::test]
    async fn test_create_short_link_custom_code_conflict() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code()
            .times(1)
            .returning(|code| Ok(Some(stored_link(code, "https://other.test", None))));
        repo.expect_create().times(0);

        let result = service(repo)
            .create_short_link(request("https://x.test", Some("taken1")))
            .await;

        assert!(matches!(result.unwrap_err(), AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_create_short_link_storage_collision_is_conflict() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code().returning(|_| Ok(None));
        repo.expect_create()
            .times(1)
            .returning(|new_link| Err(RepositoryError::Conflict(new_link.code)));

        let result = service(repo)
            .create_short_link(request("https://x.test", Some("raced1")))
            .await;

        assert!(matches!(result.unwrap_err(), AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_create_short_link_invalid_custom_codes() {
        for code in ["12345", "abcdef!", "123456"] {
            let mut repo = MockLinkRepository::new();
            repo.expect_find_by_code().times(0);
            repo.expect_create().times(0);

            let result = service(repo)
                .create_short_link(request("https://x.test", Some(code)))
                .await;

            assert!(
                matches!(result, Err(AppError::InvalidRequest { .. })),
                "code {} should be rejected",
                code
            );
        }
    }

    #[tokio::test]
    async fn test_create_short_link_empty_custom_code_generates() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code().times(1).returning(|_| Ok(None));
        repo.expect_create()
            .withf(|new_link| !new_link.code.is_empty())
            .times(1)
            .returning(|new_link| Ok(new_link.into_link(1)));

        let created = service(repo)
            .create_short_link(request("https://x.test", Some("")))
            .await
            .unwrap();

        assert_eq!(created.code.len(), DEFAULT_CODE_LENGTH);
    }

    #[tokio::test]
    async fn test_create_short_link_invalid_urls() {
        for url in ["", "ftp://x", "not a url", "http://"] {
            let mut repo = MockLinkRepository::new();
            repo.expect_find_by_code().times(0);
            repo.expect_create().times(0);

            let result = service(repo).create_short_link(request(url, None)).await;

            assert!(
                matches!(result, Err(AppError::InvalidRequest { .. })),
                "url {:?} should be rejected",
                url
            );
        }
    }

    #[tokio::test]
    async fn test_create_short_link_rejects_past_expiration() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code().returning(|_| Ok(None));
        repo.expect_create().times(0);

        let mut req = request("https://x.test", None);
        req.expire_at = Some(Utc::now() - ChronoDuration::seconds(1));

        let err = service(repo).create_short_link(req).await.unwrap_err();

        assert!(matches!(err, AppError::InvalidRequest { .. }));
        assert_eq!(err.to_string(), "expire_at must be in the future");
    }

    #[tokio::test]
    async fn test_create_short_link_keeps_future_expiration() {
        let expire_at = Utc::now() + ChronoDuration::hours(1);

        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code().returning(|_| Ok(None));
        repo.expect_create()
            .withf(move |new_link| new_link.expire_at == Some(expire_at))
            .times(1)
            .returning(|new_link| Ok(new_link.into_link(1)));

        let mut req = request("https://x.test", None);
        req.expire_at = Some(expire_at);

        let created = service(repo).create_short_link(req).await.unwrap();
        assert_eq!(created.expire_at, Some(expire_at));
    }

    #[tokio::test]
    async fn test_generate_code_gives_up_after_ten_collisions() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code()
            .times(MAX_CODE_ATTEMPTS)
            .returning(|code| Ok(Some(stored_link(code, "https://x.test", None))));
        repo.expect_create().times(0);

        let err = service(repo)
            .create_short_link(request("https://x.test", None))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Internal { .. }));
        assert_eq!(err.to_string(), "failed to generate unique code");
    }

    #[tokio::test]
    async fn test_generate_code_retries_after_collision() {
        let mut repo = MockLinkRepository::new();
        let mut calls = 0;
        repo.expect_find_by_code().times(3).returning(move |code| {
            calls += 1;
            if calls < 3 {
                Ok(Some(stored_link(code, "https://x.test", None)))
            } else {
                Ok(None)
            }
        });
        repo.expect_create()
            .times(1)
            .returning(|new_link| Ok(new_link.into_link(1)));

        let result = service(repo)
            .create_short_link(request("https://x.test", None))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_sequential_strategy_uses_next_id() {
        let mut repo = MockLinkRepository::new();
        repo.expect_next_id().times(1).returning(|| Ok(62));
        repo.expect_find_by_code()
            .withf(|code| code == "aaaa10")
            .times(1)
            .returning(|_| Ok(None));
        repo.expect_create()
            .withf(|new_link| new_link.id == Some(62) && new_link.code == "aaaa10")
            .times(1)
            .returning(|new_link| {
                let id = new_link.id.unwrap_or_default();
                Ok(new_link.into_link(id))
            });

        let created = LinkService::new(Arc::new(repo), BASE_URL)
            .with_code_strategy(CodeStrategy::Sequential, DEFAULT_CODE_LENGTH)
            .create_short_link(request("https://x.test", None))
            .await
            .unwrap();

        assert_eq!(created.code, "aaaa10");
    }

    #[tokio::test]
    async fn test_get_long_url_records_click() {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code()
            .returning(|code| Ok(Some(stored_link(code, "https://example.com/a", None))));
        repo.expect_increment_click()
            .withf(|code| code == "abc123")
            .times(1)
            .returning(move |code| {
                let _ = tx.send(code.to_string());
                Ok(())
            });

        let url = service(repo).get_long_url("abc123").await.unwrap();
        assert_eq!(url, "https://example.com/a");

        let clicked = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap();
        assert_eq!(clicked.as_deref(), Some("abc123"));
    }

    #[tokio::test]
    async fn test_get_long_url_ignores_click_failure() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code()
            .returning(|code| Ok(Some(stored_link(code, "https://example.com", None))));
        repo.expect_increment_click()
            .returning(|_| Err(RepositoryError::InvalidData("boom".to_string())));

        let result = service(repo).get_long_url("abc123").await;

        assert_eq!(result.unwrap(), "https://example.com");
    }

    #[tokio::test]
    async fn test_get_long_url_not_found() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code().returning(|_| Ok(None));
        repo.expect_increment_click().times(0);

        let err = service(repo).get_long_url("nothere").await.unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
        assert_eq!(err.to_string(), "short link not found");
    }

    #[tokio::test]
    async fn test_get_long_url_expired() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code().returning(|code| {
            Ok(Some(stored_link(
                code,
                "https://example.com",
                Some(Utc::now() - ChronoDuration::seconds(1)),
            )))
        });
        repo.expect_increment_click().times(0);

        let err = service(repo).get_long_url("old123").await.unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
        assert_eq!(err.to_string(), "short link expired");
    }

    #[tokio::test]
    async fn test_get_long_url_unusable_stored_url_is_not_counted() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code()
            .returning(|code| Ok(Some(stored_link(code, "https://example.com/a\nb", None))));
        repo.expect_increment_click().times(0);

        let err = service(repo).get_long_url("bad123").await.unwrap_err();

        assert!(matches!(err, AppError::Internal { .. }));
    }

    #[tokio::test]
    async fn test_get_long_url_storage_failure() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code()
            .returning(|_| Err(RepositoryError::InvalidData("broken".to_string())));

        let err = service(repo).get_long_url("abc123").await.unwrap_err();

        assert!(matches!(err, AppError::Internal { .. }));
    }

    #[tokio::test]
    async fn test_get_link_info_returns_expired_record() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code().returning(|code| {
            let mut link = stored_link(
                code,
                "https://example.com",
                Some(Utc::now() - ChronoDuration::seconds(1)),
            );
            link.click_count = 3;
            Ok(Some(link))
        });

        let link = service(repo).get_link_info("old123").await.unwrap();

        assert_eq!(link.code, "old123");
        assert_eq!(link.click_count, 3);
    }

    #[tokio::test]
    async fn test_get_link_info_not_found() {
        let mut repo = MockLinkRepository::new();
        repo.expect_find_by_code().returning(|_| Ok(None));

        let err = service(repo).get_link_info("nothere").await.unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[test]
    fn test_short_url_trims_trailing_slash() {
        let service = LinkService::new(Arc::new(MockLinkRepository::new()), "https://s.test/");
        assert_eq!(service.short_url("abcdef"), "https://s.test/abcdef");
    }

    #[test]
    fn test_code_strategy_from_str() {
        assert_eq!("random".parse::<CodeStrategy>(), Ok(CodeStrategy::Random));
        assert_eq!("Sequential".parse::<CodeStrategy>(), Ok(CodeStrategy::Sequential));
        assert!("uuid".parse::<CodeStrategy>().is_err());
    }
}
