//! Search index provider trait definition.
//!
//! This module defines the abstract interface for search index operations,
//! allowing for different backend implementations (OpenSearch, Elasticsearch, etc.).

use async_trait::async_trait;
use movies_etl_shared::MovieDocument;

use crate::errors::SearchIndexError;
use crate::types::BatchOperationSummary;

/// Abstracts the underlying search index implementation (OpenSearch, Elasticsearch, etc.).
///
/// Implementations are injected into the loader stage to enable dependency
/// injection and easy testing with mock implementations.
///
/// # Note on Document Writes
///
/// There is no partial update. Every write is a full overwrite keyed by the
/// document id, so re-indexing an unchanged document is a no-op in effect.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Ensure the search index exists, creating it from the configured schema if necessary.
    ///
    /// This method should be called during application startup, before the
    /// first sweep.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the index is ready for use
    /// * `Err(SearchIndexError)` - If initialization fails
    async fn ensure_index_exists(&self) -> Result<(), SearchIndexError>;

    /// Insert or fully replace a batch of documents in a single bulk request.
    ///
    /// # Arguments
    ///
    /// * `documents` - Documents to write, keyed by `MovieDocument::id`
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - Per-document outcomes of the bulk request
    /// * `Err(SearchIndexError)` - If the bulk request failed entirely
    async fn bulk_upsert_documents(
        &self,
        documents: &[MovieDocument],
    ) -> Result<BatchOperationSummary, SearchIndexError>;
}
