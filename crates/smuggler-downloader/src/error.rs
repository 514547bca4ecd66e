//! Error types for the download manager.

use std::path::PathBuf;
use thiserror::Error;

/// Download-specific error types.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Transport failure from the fetcher.
    #[error(transparent)]
    Fetch(#[from] smuggler_fetch::FetchError),

    /// Computed digest differs from the declared one. The partial file is
    /// deleted and the failure is treated as transport for retry purposes.
    #[error("checksum mismatch for '{name}': expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Package name.
        name: String,
        /// Declared hex digest.
        expected: String,
        /// Computed hex digest.
        actual: String,
    },

    /// I/O error with path context.
    #[error("I/O error at {path}: {message}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// The package's repository has no resolved base URL.
    #[error("no base URL for repository '{repo_id}'")]
    UnknownRepository {
        /// Repository id without a URL mapping.
        repo_id: String,
    },

    /// URL construction failed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The pool was cancelled.
    #[error("download cancelled")]
    Cancelled,
}

impl DownloadError {
    /// Create an I/O error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Whether another attempt could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_retryable(),
            Self::ChecksumMismatch { .. } => true,
            _ => false,
        }
    }
}

impl From<url::ParseError> for DownloadError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl From<DownloadError> for smuggler_core::Error {
    fn from(err: DownloadError) -> Self {
        match err {
            DownloadError::Fetch(e) => e.into(),
            DownloadError::Cancelled => Self::Cancelled,
            DownloadError::Io { path, message } => Self::Io { path, message },
            DownloadError::ChecksumMismatch {
                name,
                expected,
                actual,
            } => Self::ChecksumMismatch {
                name,
                expected,
                actual,
            },
            other => Self::network(other.to_string()),
        }
    }
}

/// Result type for download operations.
pub type Result<T> = std::result::Result<T, DownloadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_mismatch_is_retryable() {
        let err = DownloadError::ChecksumMismatch {
            name: "curl".into(),
            expected: "aa".into(),
            actual: "bb".into(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn unknown_repository_is_not() {
        let err = DownloadError::UnknownRepository {
            repo_id: "baseos".into(),
        };
        assert!(!err.is_retryable());
        assert!(!DownloadError::Cancelled.is_retryable());
    }
}
