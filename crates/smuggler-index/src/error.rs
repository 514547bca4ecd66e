//! Error types for metadata parsing and loading.

use thiserror::Error;

/// Index-specific error types.
///
/// These cover whole-artefact failures. A single malformed package entry is
/// never an error: the entry is skipped with a logged warning and the load
/// continues.
#[derive(Error, Debug)]
pub enum IndexError {
    /// Fetching an artefact failed after retries.
    #[error(transparent)]
    Fetch(#[from] smuggler_fetch::FetchError),

    /// Catalog rejected the repository (configuration-fatal).
    #[error(transparent)]
    Catalog(#[from] smuggler_catalog::CatalogError),

    /// XML could not be parsed at all.
    #[error("xml error: {0}")]
    Xml(String),

    /// An artefact was structurally unusable.
    #[error("malformed {family} metadata: {message}")]
    Malformed {
        /// Family whose artefact failed.
        family: &'static str,
        /// What was wrong.
        message: String,
    },
}

impl IndexError {
    /// Create a malformed-metadata error.
    #[must_use]
    pub fn malformed(family: &'static str, message: impl Into<String>) -> Self {
        Self::Malformed {
            family,
            message: message.into(),
        }
    }
}

impl From<quick_xml::Error> for IndexError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err.to_string())
    }
}

impl From<IndexError> for smuggler_core::Error {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::Fetch(e) => e.into(),
            IndexError::Catalog(e) => e.into(),
            IndexError::Xml(message) => Self::parse("yum", message),
            IndexError::Malformed { family, message } => Self::parse(family, message),
        }
    }
}

/// Result type for index operations.
pub type Result<T> = std::result::Result<T, IndexError>;
