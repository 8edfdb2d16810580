//! Loader module for the movies ETL pipeline.
//!
//! Bulk-upserts transformed documents into the search index and reports
//! whether the batch went through without a single rejected document.

use std::sync::Arc;

use movies_etl_repository::SearchIndexProvider;
use movies_etl_shared::MovieDocument;
use tracing::{debug, error, info, instrument, warn, Instrument, Span};

use crate::errors::IngestError;
use crate::stats::PipelineStats;

/// Documents produced from one merged page.
#[derive(Debug, Clone, Default)]
pub struct DocumentBatch {
    pub documents: Vec<MovieDocument>,
}

/// Indexer stage: the end of the document flow.
///
/// The indexer is responsible for:
/// - Writing a batch in a single bulk request keyed by film id
/// - Logging each rejected document with its error
/// - Turning the bulk outcome into a single success flag for the batch
pub struct Indexer {
    provider: Arc<dyn SearchIndexProvider>,
    stats: Arc<PipelineStats>,
    span: Span,
}

impl Indexer {
    /// Create a new indexer writing through the given provider.
    pub fn new(provider: Arc<dyn SearchIndexProvider>, stats: Arc<PipelineStats>, span: Span) -> Self {
        Self {
            provider,
            stats,
            span,
        }
    }

    /// Index a batch.
    ///
    /// Returns `Ok(true)` only if every document was accepted. An empty batch
    /// is trivially indexed. Rejections, whether per document or of the whole
    /// request, yield `Ok(false)`; only an unreachable search engine is an error.
    pub async fn push(&self, batch: DocumentBatch) -> Result<bool, IngestError> {
        self.index(batch.documents)
            .instrument(self.span.clone())
            .await
    }

    #[instrument(skip_all, fields(document_count = documents.len()))]
    async fn index(&self, documents: Vec<MovieDocument>) -> Result<bool, IngestError> {
        if documents.is_empty() {
            debug!("No documents to index");
            return Ok(true);
        }

        let count = documents.len();
        match self.provider.bulk_upsert_documents(&documents).await {
            Ok(summary) if summary.is_complete_success() => {
                self.stats.record_indexed(summary.succeeded);
                info!(count = summary.succeeded, "Indexed documents");
                Ok(true)
            }
            Ok(summary) => {
                warn!(
                    succeeded = summary.succeeded,
                    failed = summary.failed,
                    "Bulk upsert completed with some failures"
                );
                for result in summary.results.iter().filter(|r| !r.success) {
                    if let Some(ref err) = result.error {
                        error!(
                            document_id = %result.document_id,
                            error = %err,
                            "Failed to index document"
                        );
                    }
                }
                self.stats.record_indexed(summary.succeeded);
                self.stats.record_failed_batch();
                Ok(false)
            }
            Err(e) if e.is_transient() => {
                error!(error = %e, count = count, "Search engine unreachable");
                Err(e.into())
            }
            Err(e) => {
                error!(error = %e, count = count, "Bulk upsert rejected");
                self.stats.record_failed_batch();
                Ok(false)
            }
        }
    }
}
