//! Shared error type.
//!
//! Each crate in the workspace defines its own error enum and bridges into
//! this one at the API boundary. Per-item failures (a malformed metadata
//! entry, one failed download) never surface here — they are data in the
//! respective result types. Only configuration-fatal conditions and
//! cancellation propagate to callers.

use std::path::PathBuf;
use thiserror::Error;

/// Workspace-level error.
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP failure after retries were exhausted.
    #[error("network error: {message}")]
    Network {
        /// Error message.
        message: String,
        /// URL that failed, when known.
        url: Option<String>,
    },

    /// Malformed repository metadata that made a whole artefact unusable.
    #[error("parse error in {family} metadata: {message}")]
    Parse {
        /// Family whose parser failed.
        family: String,
        /// Error message.
        message: String,
    },

    /// Checksum verification failure.
    #[error("checksum mismatch for '{name}': expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Package or artefact name.
        name: String,
        /// Expected hex digest.
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

    /// Metadata cache failure.
    #[error("cache error: {0}")]
    Cache(String),

    /// Invalid configuration: unknown distribution, unresolved URL template
    /// variable, and the like. Raised before any I/O happens.
    #[error("configuration error: {0}")]
    Config(String),

    /// Operation cancelled; partial results were returned where applicable.
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Create a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            url: None,
        }
    }

    /// Create a network error with the failing URL.
    #[must_use]
    pub fn network_at(message: impl Into<String>, url: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            url: Some(url.into()),
        }
    }

    /// Create a parse error.
    #[must_use]
    pub fn parse(family: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            family: family.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether retrying the operation could help.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::ChecksumMismatch { .. })
    }
}

/// Result alias for workspace operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(Error::network("connection reset").is_retryable());
        assert!(!Error::config("unknown distribution").is_retryable());
        assert!(!Error::Cancelled.is_retryable());
    }

    #[test]
    fn display_carries_context() {
        let err = Error::parse("apt", "bad stanza");
        assert_eq!(err.to_string(), "parse error in apt metadata: bad stanza");
    }
}
