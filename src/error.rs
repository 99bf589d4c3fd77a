//! Error types for social-archiver
//!
//! [`Error`] is what control operations return. Each pluggable backend has its own
//! error enum ([`SourceError`], [`FetchError`], [`SinkError`]) so the pipeline can decide
//! per failure whether to retry, park the account or just log it.

use crate::types::AccountId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for social-archiver operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for social-archiver
///
/// Control operations (adding accounts, changing the interval, loading config) fail
/// synchronously with one of these. Failures inside a check cycle never surface here;
/// they are recorded in the event log instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "log_retention_count")
        key: Option<String>,
    },

    /// Account handle is empty after normalization
    #[error("invalid handle: {0:?}")]
    InvalidHandle(String),

    /// Check interval outside the accepted bounds
    #[error("invalid check interval: {seconds}s (must be between {min}s and {max}s)")]
    InvalidInterval {
        /// The rejected interval in seconds
        seconds: u64,
        /// Smallest accepted interval
        min: u64,
        /// Largest accepted interval
        max: u64,
    },

    /// Account not present in the registry
    #[error("account {0} not found")]
    AccountNotFound(AccountId),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Shutdown in progress - not accepting new work
    #[error("shutdown in progress")]
    ShuttingDown,
}

/// Failures reported by a [`ContentSource`](crate::source::ContentSource)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Transient network or backend failure
    #[error("content source unavailable: {0}")]
    SourceUnavailable(String),

    /// The platform asked us to slow down
    #[error("content source rate limited: {0}")]
    SourceRateLimited(String),

    /// Session expired or login wall; needs a human
    #[error("authentication required: {0}")]
    AuthRequired(String),
}

impl SourceError {
    /// Whether this failure should park the account in the error state
    pub fn requires_intervention(&self) -> bool {
        matches!(self, SourceError::AuthRequired(_))
    }
}

/// Failures reported by a [`MediaFetcher`](crate::media::MediaFetcher)
#[derive(Debug, Error)]
pub enum FetchError {
    /// Upstream answered with a non-success HTTP status
    #[error("HTTP {status} fetching {media_ref}")]
    Status {
        /// HTTP status code
        status: u16,
        /// The media reference that was requested
        media_ref: String,
    },

    /// Connection, timeout or body read failure
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Local file read failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The reference is not something this fetcher can resolve
    #[error("unsupported media reference: {0}")]
    InvalidReference(String),

    /// The body is larger than `archive.max_media_bytes`
    #[error("{media_ref} exceeds the {limit} byte media limit")]
    TooLarge {
        /// The media reference that was requested
        media_ref: String,
        /// Configured limit in bytes
        limit: u64,
    },
}

/// Failures reported by an [`ArchiveSink`](crate::sink::ArchiveSink)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// Storage backend unreachable or write failed
    #[error("archive sink unavailable: {0}")]
    SinkUnavailable(String),

    /// Destination is out of space or quota
    #[error("archive quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The suggested name cannot be stored safely
    #[error("invalid archive name: {0}")]
    InvalidName(String),
}

/// API error response format
///
/// Returned by API endpoints when an error occurs.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "account_not_found",
///     "message": "account 7 not found",
///     "details": {
///       "account_id": 7
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "invalid_handle")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Attach structured context to the error body
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.error.details = Some(details);
        self
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - rejected input
            Error::Config { .. } => 400,
            Error::InvalidHandle(_) => 400,
            Error::InvalidInterval { .. } => 400,

            // 404 Not Found
            Error::AccountNotFound(_) => 404,

            // 502 Bad Gateway - upstream failure
            Error::Network(_) => 502,

            // 503 Service Unavailable
            Error::ShuttingDown => 503,

            // 500 Internal Server Error
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::InvalidHandle(_) => "invalid_handle",
            Error::InvalidInterval { .. } => "invalid_interval",
            Error::AccountNotFound(_) => "account_not_found",
            Error::Network(_) => "network_error",
            Error::ShuttingDown => "shutting_down",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::AccountNotFound(id) => Some(serde_json::json!({ "account_id": id.get() })),
            Error::InvalidInterval { seconds, min, max } => Some(serde_json::json!({
                "seconds": seconds,
                "min": min,
                "max": max,
            })),
            Error::Config {
                key: Some(key), ..
            } => Some(serde_json::json!({ "key": key })),
            _ => None,
        };

        let api = ApiError::new(code, message);
        match details {
            Some(details) => api.with_details(details),
            None => api,
        }
    }
}
