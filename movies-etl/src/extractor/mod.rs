//! Extractor module for the movies ETL pipeline.
//!
//! Scans one tracked table for rows changed after a watermark and feeds them
//! to the enricher one page at a time. The next page is only fetched after
//! the previous one went through every downstream stage.
//!
//! The candidate watermark of a page is the `updated_at` of its last row. The
//! next sweep resumes strictly after the saved watermark, so a candidate is
//! only saved once no unindexed row can share its timestamp: when the next
//! page starts at a later timestamp, or when the table is drained.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use movies_etl_repository::CatalogRepository;
use movies_etl_shared::{PageCursor, TrackedTable};
use tracing::{debug, info, instrument, warn, Instrument, Span};

use crate::checkpoint::{Checkpoint, CheckpointWriter};
use crate::enricher::{ChangedPage, Enricher};
use crate::errors::IngestError;
use crate::stats::PipelineStats;

/// Request to drain the backlog of `table` from `since` (exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepRequest {
    pub table: TrackedTable,
    pub since: DateTime<Utc>,
}

/// Outcome of draining one table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSweep {
    pub table: TrackedTable,
    /// Non-empty pages pushed downstream.
    pub pages: usize,
    pub rows: usize,
    /// False if a page was not fully indexed and the scan stopped there.
    pub completed: bool,
}

/// Extractor stage.
pub struct Extractor {
    catalog: Arc<dyn CatalogRepository>,
    next: Enricher,
    checkpoints: Arc<CheckpointWriter>,
    page_size: usize,
    stats: Arc<PipelineStats>,
    span: Span,
}

impl Extractor {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        next: Enricher,
        checkpoints: Arc<CheckpointWriter>,
        page_size: usize,
        stats: Arc<PipelineStats>,
        span: Span,
    ) -> Self {
        Self {
            catalog,
            next,
            checkpoints,
            page_size: page_size.max(1),
            stats,
            span,
        }
    }

    /// Drain the table's backlog, stopping at the first empty page.
    ///
    /// A page that is not fully indexed also ends the scan. Neither its
    /// candidate nor a deferred one tied with its first row is saved, so the
    /// next sweep re-offers every row of the failed page.
    pub async fn push(&self, request: SweepRequest) -> Result<TableSweep, IngestError> {
        self.extract(request).instrument(self.span.clone()).await
    }

    #[instrument(skip_all, fields(table = %request.table, since = %request.since))]
    async fn extract(&self, request: SweepRequest) -> Result<TableSweep, IngestError> {
        let mut cursor = PageCursor::since(request.since);
        let mut sweep = TableSweep {
            table: request.table,
            pages: 0,
            rows: 0,
            completed: true,
        };

        // Candidate of the last indexed page, waiting for the end of its timestamp group.
        let mut pending: Option<Checkpoint> = None;

        loop {
            let rows = self
                .catalog
                .changed_rows(request.table, &cursor, self.page_size)
                .await?;
            let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
                if let Some(checkpoint) = pending.take() {
                    self.checkpoints.push(checkpoint, true).await?;
                }
                break;
            };

            if let Some(checkpoint) = pending {
                if first.updated_at > checkpoint.value {
                    self.checkpoints.push(checkpoint, true).await?;
                    pending = None;
                } else {
                    debug!(
                        value = %checkpoint.value,
                        "Page continues a timestamp group, deferring watermark"
                    );
                }
            }

            let candidate = Checkpoint {
                table: request.table,
                value: last.updated_at,
            };
            cursor = PageCursor::after(last);

            sweep.pages += 1;
            sweep.rows += rows.len();
            self.stats.record_page();
            info!(rows = rows.len(), page = sweep.pages, "Extracted changes");

            let page = ChangedPage {
                table: request.table,
                rows,
            };
            if !self.next.push(page).await? {
                self.checkpoints.push(candidate, false).await?;
                warn!(
                    page = sweep.pages,
                    "Page not fully indexed, deferring the rest of the table to the next sweep"
                );
                sweep.completed = false;
                break;
            }
            pending = Some(candidate);
        }

        Ok(sweep)
    }
}
