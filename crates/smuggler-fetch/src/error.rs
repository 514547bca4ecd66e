//! Error types for the fetcher.

use std::path::PathBuf;
use thiserror::Error;

/// Fetch-specific error types.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Connection-level failure.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Request timed out.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Server answered with an error status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// URL that failed.
        url: String,
    },

    /// I/O error with path context.
    #[error("I/O error at {path}: {message}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Malformed URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Archive or compressed payload could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The request was cancelled through its token.
    #[error("fetch cancelled")]
    Cancelled,
}

impl FetchError {
    /// Create an I/O error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Whether another attempt could succeed.
    ///
    /// Transport failures and 5xx retry; 408 and 429 retry; every other 4xx
    /// fails immediately.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Timeout(_) => true,
            Self::Status { status, .. } => {
                *status >= 500 || *status == 408 || *status == 429
            }
            _ => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout(err.to_string());
        }
        if err.is_connect() {
            return Self::Connection(err.to_string());
        }
        if let Some(status) = err.status() {
            return Self::Status {
                status: status.as_u16(),
                url: err.url().map(ToString::to_string).unwrap_or_default(),
            };
        }
        Self::Connection(err.to_string())
    }
}

impl From<FetchError> for smuggler_core::Error {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Cancelled => Self::Cancelled,
            FetchError::Io { path, message } => Self::Io { path, message },
            FetchError::Status { status, url } => {
                Self::network_at(format!("HTTP {status}"), url)
            }
            other => Self::network(other.to_string()),
        }
    }
}

/// Result type for fetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;
