//! Enricher module for the movies ETL pipeline.
//!
//! Maps a page of changed rows to the films whose documents they affect and
//! reports whether all of those films were indexed.
//!
//! - `film_work` rows are films already and pass straight through.
//! - `genre` and `person` rows are resolved through their join tables to the
//!   distinct films referencing them, paged by the films' own `updated_at`.

use std::sync::Arc;

use movies_etl_repository::CatalogRepository;
use movies_etl_shared::{ChangedRow, PageCursor, TrackedTable};
use tracing::{debug, info, Instrument, Span};
use uuid::Uuid;

use crate::errors::IngestError;
use crate::merger::{Merger, RootBatch};
use crate::stats::PipelineStats;

/// One extractor page of changed rows from `table`.
#[derive(Debug, Clone)]
pub struct ChangedPage {
    pub table: TrackedTable,
    pub rows: Vec<ChangedRow>,
}

/// Enricher stage.
pub struct Enricher {
    catalog: Arc<dyn CatalogRepository>,
    next: Merger,
    page_size: usize,
    stats: Arc<PipelineStats>,
    span: Span,
}

impl Enricher {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        next: Merger,
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

    /// Push a page through the rest of the pipeline.
    ///
    /// Returns `Ok(true)` if every affected film was indexed. A child page
    /// that no film references is trivially indexed.
    pub async fn push(&self, page: ChangedPage) -> Result<bool, IngestError> {
        self.enrich(page).instrument(self.span.clone()).await
    }

    async fn enrich(&self, page: ChangedPage) -> Result<bool, IngestError> {
        if page.rows.is_empty() {
            return Ok(true);
        }

        if page.table.is_root() {
            let film_ids: Vec<Uuid> = page.rows.iter().map(|row| row.id).collect();
            self.stats.record_enriched(film_ids.len());
            self.next.push(RootBatch { film_ids }).await
        } else {
            self.push_referencing_films(page.table, &page.rows).await
        }
    }

    /// Page through the films referencing `rows` until a page comes back empty.
    async fn push_referencing_films(
        &self,
        table: TrackedTable,
        rows: &[ChangedRow],
    ) -> Result<bool, IngestError> {
        info!(table = %table, rows = rows.len(), "Enriching changes");

        let child_ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut cursor: Option<PageCursor> = None;
        let mut all_indexed = true;
        let mut films_total = 0usize;

        loop {
            let films = self
                .catalog
                .films_referencing(table, &child_ids, cursor.as_ref(), self.page_size)
                .await?;
            let Some(last) = films.last() else {
                break;
            };
            cursor = Some(PageCursor::after(last));
            films_total += films.len();
            self.stats.record_enriched(films.len());

            let film_ids = films.iter().map(|film| film.id).collect();
            if !self.next.push(RootBatch { film_ids }).await? {
                all_indexed = false;
            }
        }

        debug!(
            table = %table,
            children = child_ids.len(),
            films = films_total,
            "Enrichment drained"
        );
        Ok(all_indexed)
    }
}
