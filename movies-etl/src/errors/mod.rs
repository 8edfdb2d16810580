//! Error types for the movies ETL pipeline.

use movies_etl_repository::{CatalogError, CheckpointError, SearchIndexError};
use thiserror::Error;

/// Errors that can abort a sweep attempt.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Error reading from the relational catalog.
    #[error("Catalog error: {0}")]
    CatalogError(#[from] CatalogError),

    /// Error talking to the search index.
    #[error("Search index error: {0}")]
    SearchIndexError(#[from] SearchIndexError),

    /// Error reading or persisting a watermark.
    #[error("Checkpoint error: {0}")]
    CheckpointError(#[from] CheckpointError),

    /// The outer retry policy ran out of attempts.
    #[error("Retry budget exhausted after {attempts} attempts: {last_error}")]
    RetryBudgetExhausted {
        attempts: usize,
        last_error: Box<IngestError>,
    },
}

impl IngestError {
    /// Whether the error is a loss of connectivity to the catalog or the search engine.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::CatalogError(e) => e.is_transient(),
            Self::SearchIndexError(e) => e.is_transient(),
            Self::CheckpointError(_) | Self::RetryBudgetExhausted { .. } => false,
        }
    }
}
