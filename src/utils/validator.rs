//! Input validation for long URLs and user-chosen short codes.
//!
//! Both checks are pure and run before any storage access.

use thiserror::Error;
use url::Url;

/// Maximum accepted length of a long URL, in bytes.
pub const MAX_URL_LENGTH: usize = 2048;

/// Minimum length of a short code.
pub const MIN_CODE_LENGTH: usize = 6;

/// Maximum length of a short code.
pub const MAX_CODE_LENGTH: usize = 32;

/// Reasons a long URL or short code is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("url is required")]
    EmptyUrl,
    #[error("url exceeds maximum length of 2048 characters")]
    UrlTooLong,
    #[error("invalid url format, must be an absolute http or https url")]
    InvalidUrl,
    #[error("url scheme must be http or https")]
    InvalidScheme,
    #[error("code is required")]
    EmptyCode,
    #[error("code must be at least 6 characters")]
    CodeTooShort,
    #[error("code exceeds maximum length of 32 characters")]
    CodeTooLong,
    #[error("code contains invalid characters, only alphanumeric allowed")]
    InvalidCode,
    #[error("code cannot consist of digits only")]
    CodeAllDigits,
}

impl ValidationError {
    /// Machine-readable reason, returned to API clients in error details.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::EmptyUrl => "empty_url",
            Self::UrlTooLong => "url_too_long",
            Self::InvalidUrl => "invalid_url",
            Self::InvalidScheme => "invalid_scheme",
            Self::EmptyCode => "empty_code",
            Self::CodeTooShort => "code_too_short",
            Self::CodeTooLong => "code_too_long",
            Self::InvalidCode => "invalid_code",
            Self::CodeAllDigits => "code_all_digits",
        }
    }
}

/// Validates a long URL.
///
/// # Rules
///
/// - Not empty, at most [`MAX_URL_LENGTH`] bytes
/// - No ASCII control characters (`Url::parse` would silently drop tabs and
///   newlines, but the raw string is what gets stored and redirected to)
/// - Parses as an absolute URL
/// - Scheme is `http` or `https` (case-insensitive)
/// - Host is present and non-empty
///
/// # Errors
///
/// Returns the first [`ValidationError`] that applies, checked in the order above.
pub fn validate_url(raw: &str) -> Result<(), ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::EmptyUrl);
    }
    if raw.len() > MAX_URL_LENGTH {
        return Err(ValidationError::UrlTooLong);
    }
    if raw.bytes().any(|b| b.is_ascii_control()) {
        return Err(ValidationError::InvalidUrl);
    }

    let parsed = Url::parse(raw).map_err(|_| ValidationError::InvalidUrl)?;

    // `Url` lowercases the scheme while parsing.
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ValidationError::InvalidScheme);
    }

    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(ValidationError::InvalidUrl),
    }
}

/// Validates a short code supplied by the caller.
///
/// # Rules
///
/// - Length between [`MIN_CODE_LENGTH`] and [`MAX_CODE_LENGTH`]
/// - ASCII letters and digits only
/// - At least one letter
///
/// # Errors
///
/// Returns the first [`ValidationError`] that applies.
pub fn validate_code(code: &str) -> Result<(), ValidationError> {
    if code.is_empty() {
        return Err(ValidationError::EmptyCode);
    }
    if code.len() < MIN_CODE_LENGTH {
        return Err(ValidationError::CodeTooShort);
    }
    if code.len() > MAX_CODE_LENGTH {
        return Err(ValidationError::CodeTooLong);
    }
    if !code.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidCode);
    }
    if code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::CodeAllDigits);
    }

    Ok(())
}
