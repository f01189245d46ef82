//! HTTP boundary to the grading service.

pub mod client;
pub mod stream;

use std::fmt;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use client::{FilePart, FollowUpAnswer, GradingClient, JobCreated, JobEventStream};
pub use stream::JobEventSource;

/// Standard User-Agent header for gradex API requests.
pub const USER_AGENT: &str = concat!("gradex/", env!("CARGO_PKG_VERSION"));

/// Default grading-service URL when neither env nor config supplies one.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// Resolves the grading-service base URL.
///
/// Resolution order:
/// 1. `GRADEX_SERVER_URL` env var (if set and non-empty)
/// 2. `config_base_url` (if Some and non-empty)
/// 3. [`DEFAULT_SERVER_URL`]
///
/// # Errors
/// Returns an error when the chosen value is not a well-formed URL.
pub fn resolve_server_url(config_base_url: Option<&str>) -> Result<String> {
    let env_url = std::env::var("GRADEX_SERVER_URL").ok();
    resolve_with_env(env_url.as_deref(), config_base_url)
}

fn resolve_with_env(env_url: Option<&str>, config_base_url: Option<&str>) -> Result<String> {
    if let Some(env_url) = env_url {
        let trimmed = env_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed)?;
            return Ok(trimmed.to_string());
        }
    }

    if let Some(config_url) = config_base_url {
        let trimmed = config_url.trim();
        if !trimmed.is_empty() {
            validate_url(trimmed)?;
            return Ok(trimmed.to_string());
        }
    }

    Ok(DEFAULT_SERVER_URL.to_string())
}

fn validate_url(url: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid grading server URL: {url}"))?;
    Ok(())
}

/// Categories of API errors for consistent handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// HTTP status error (4xx, 5xx)
    HttpStatus,
    /// Connection timeout or request timeout
    Timeout,
    /// Connectivity failure (refused, dropped, DNS)
    Network,
    /// Failed to parse a response or stream frame
    Parse,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::HttpStatus => write!(f, "http_status"),
            ApiErrorKind::Timeout => write!(f, "timeout"),
            ApiErrorKind::Network => write!(f, "network"),
            ApiErrorKind::Parse => write!(f, "parse"),
        }
    }
}

/// Structured error from the grading service with kind and details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error category
    pub kind: ApiErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional additional details (e.g., raw error body)
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(status: u16, body: &str) -> Self {
        let message = format!("HTTP {status}");
        let details = if body.is_empty() {
            None
        } else {
            // Try to extract a cleaner error message from JSON
            if let Ok(json) = serde_json::from_str::<Value>(body)
                && let Some(error_obj) = json.get("error")
                && let Some(msg) = error_obj.get("message").and_then(|v| v.as_str())
            {
                return Self {
                    kind: ApiErrorKind::HttpStatus,
                    message: format!("HTTP {status}: {msg}"),
                    details: Some(body.to_string()),
                };
            }
            Some(body.to_string())
        };
        Self {
            kind: ApiErrorKind::HttpStatus,
            message,
            details,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Timeout, message)
    }

    /// Creates a connectivity error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Network, message)
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Parse, message)
    }

    /// True for errors the console shows as lost connectivity rather than
    /// a server-reported failure.
    pub fn is_connectivity(&self) -> bool {
        matches!(self.kind, ApiErrorKind::Timeout | ApiErrorKind::Network)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for grading-service calls.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

pub(crate) fn classify_reqwest_error(e: &reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::timeout(format!("Request timed out: {e}"))
    } else if e.is_connect() {
        ApiError::network(format!("Connection failed: {e}"))
    } else if e.is_request() {
        ApiError::new(ApiErrorKind::HttpStatus, format!("Request error: {e}"))
    } else {
        ApiError::network(format!("Network error: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_extracts_json_error_message() {
        let err = ApiError::http_status(404, r#"{"error": {"message": "job not found"}}"#);
        assert_eq!(err.kind, ApiErrorKind::HttpStatus);
        assert_eq!(err.message, "HTTP 404: job not found");
        assert!(err.details.is_some());
    }

    #[test]
    fn http_status_keeps_plain_body_as_details() {
        let err = ApiError::http_status(500, "internal blowup");
        assert_eq!(err.message, "HTTP 500");
        assert_eq!(err.details.as_deref(), Some("internal blowup"));
    }

    #[test]
    fn http_status_with_empty_body() {
        let err = ApiError::http_status(502, "");
        assert_eq!(err.message, "HTTP 502");
        assert_eq!(err.details, None);
    }

    #[test]
    fn connectivity_kinds() {
        assert!(ApiError::timeout("t").is_connectivity());
        assert!(ApiError::network("n").is_connectivity());
        assert!(!ApiError::http_status(500, "").is_connectivity());
        assert!(!ApiError::parse("p").is_connectivity());
    }

    #[test]
    fn kind_display_is_snake_case() {
        assert_eq!(ApiErrorKind::HttpStatus.to_string(), "http_status");
        assert_eq!(ApiErrorKind::Network.to_string(), "network");
    }

    #[test]
    fn server_url_env_beats_config() {
        let url = resolve_with_env(Some("http://env:9000"), Some("http://config:9000")).unwrap();
        assert_eq!(url, "http://env:9000");
    }

    #[test]
    fn server_url_blank_env_falls_through_to_config() {
        let url = resolve_with_env(Some("   "), Some("http://config:9000")).unwrap();
        assert_eq!(url, "http://config:9000");
    }

    #[test]
    fn server_url_rejects_garbage() {
        assert!(resolve_with_env(None, Some("not a url")).is_err());
    }

    #[test]
    fn server_url_falls_back_to_default() {
        let url = resolve_with_env(None, Some("   ")).expect("default applies");
        assert_eq!(url, DEFAULT_SERVER_URL);
    }
}
