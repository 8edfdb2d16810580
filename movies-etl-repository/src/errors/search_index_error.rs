//! Search index error types.
//!
//! Covers every way a write to the `movies` index can go wrong, from an
//! unreachable node to a single film document rejected by the mapping.

use thiserror::Error;

/// Errors returned by a `SearchIndexProvider`.
///
/// Only `ConnectionError` is transient: it means the search engine could not be
/// reached at all, and the caller should abort and retry later.
#[derive(Debug, Clone, Error)]
pub enum SearchIndexError {
    /// Bad provider input, such as an unparsable URL or index schema.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Failed to reach the search index backend.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// A film document was rejected, e.g. by the strict mapping.
    #[error("Index error: {0}")]
    IndexError(String),

    /// The bulk request was rejected as a whole.
    #[error("Bulk index error: {0}")]
    BulkIndexError(String),

    /// Failed to create the search index.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// A response or schema file was not the expected JSON.
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl SearchIndexError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create an index error.
    pub fn index(msg: impl Into<String>) -> Self {
        Self::IndexError(msg.into())
    }

    /// Create a bulk index error.
    pub fn bulk_index(msg: impl Into<String>) -> Self {
        Self::BulkIndexError(msg.into())
    }

    /// Create an index creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Whether the error means the backend was unreachable.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConnectionError(_))
    }
}
