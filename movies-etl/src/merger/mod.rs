//! Merger module for the movies ETL pipeline.
//!
//! Turns a page of film ids into denormalized film aggregates with a single
//! grouped join per page.

use std::sync::Arc;

use movies_etl_repository::CatalogRepository;
use tracing::{debug, Instrument, Span};
use uuid::Uuid;

use crate::errors::IngestError;
use crate::processor::{AggregateBatch, MovieTransformer};
use crate::stats::PipelineStats;

/// Film ids whose documents must be rebuilt.
#[derive(Debug, Clone, Default)]
pub struct RootBatch {
    pub film_ids: Vec<Uuid>,
}

/// Merger stage.
pub struct Merger {
    catalog: Arc<dyn CatalogRepository>,
    next: MovieTransformer,
    page_size: usize,
    stats: Arc<PipelineStats>,
    span: Span,
}

impl Merger {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        next: MovieTransformer,
        page_size: usize,
        stats: Arc<PipelineStats>,
        span: Span,
    ) -> Self {
        Self {
            catalog,
            next,
            page_size: page_size.max(1),
            stats,
            span,
        }
    }

    /// Merge the films of `batch` page by page and push each page downstream.
    ///
    /// Returns `Ok(true)` only if every page was fully indexed.
    pub async fn push(&self, batch: RootBatch) -> Result<bool, IngestError> {
        self.merge(batch).instrument(self.span.clone()).await
    }

    async fn merge(&self, batch: RootBatch) -> Result<bool, IngestError> {
        let mut all_indexed = true;

        for film_ids in batch.film_ids.chunks(self.page_size) {
            let rows = self.catalog.aggregate_rows(film_ids).await?;
            self.stats.record_merged(rows.len());
            debug!(
                requested = film_ids.len(),
                merged = rows.len(),
                "Merged film aggregates"
            );

            if !self.next.push(AggregateBatch { rows }).await? {
                all_indexed = false;
            }
        }

        Ok(all_indexed)
    }
}
