//! Error types for mirror synthesis.

use std::path::PathBuf;
use thiserror::Error;

/// Mirror-specific error types.
#[derive(Error, Debug)]
pub enum MirrorError {
    /// I/O error with path context.
    #[error("I/O error at {path}: {message}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// A downloaded package file expected under the input directory is
    /// missing.
    #[error("package file not found: {path}")]
    MissingPackageFile {
        /// Expected file path.
        path: PathBuf,
    },

    /// XML writing failed.
    #[error("xml error: {0}")]
    Xml(String),
}

impl MirrorError {
    /// Create an I/O error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl From<quick_xml::Error> for MirrorError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err.to_string())
    }
}

impl From<MirrorError> for smuggler_core::Error {
    fn from(err: MirrorError) -> Self {
        match err {
            MirrorError::Io { path, message } => Self::Io { path, message },
            MirrorError::MissingPackageFile { path } => Self::Io {
                path,
                message: "package file not found".to_string(),
            },
            MirrorError::Xml(message) => Self::parse("mirror", message),
        }
    }
}

/// Result type for mirror operations.
pub type Result<T> = std::result::Result<T, MirrorError>;
