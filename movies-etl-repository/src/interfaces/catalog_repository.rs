//! This module defines the `CatalogRepository` trait, the read-only view of the
//! relational movie catalog used by the extract, enrich and merge stages.
use async_trait::async_trait;
use movies_etl_shared::{AggregateRow, ChangedRow, PageCursor, TrackedTable};
use uuid::Uuid;

use crate::errors::CatalogError;

/// A trait that defines the read operations the pipeline performs on the catalog.
///
/// Every method returns at most one page. Callers drive pagination by passing
/// the cursor of the last row they received.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Rows of `table` lying after `cursor`, ordered by `(updated_at, id)` ascending.
    ///
    /// # Arguments
    ///
    /// * `table` - The table to scan
    /// * `cursor` - Scan position; see [`PageCursor`]
    /// * `limit` - Maximum number of rows to return
    async fn changed_rows(
        &self,
        table: TrackedTable,
        cursor: &PageCursor,
        limit: usize,
    ) -> Result<Vec<ChangedRow>, CatalogError>;

    /// Distinct films referencing any of `child_ids` through the join table of `table`.
    ///
    /// Rows carry the film's own `updated_at` and are ordered by
    /// `(updated_at, id)` ascending. `cursor` is `None` for the first page.
    /// Children referenced by no film contribute no rows.
    async fn films_referencing(
        &self,
        table: TrackedTable,
        child_ids: &[Uuid],
        cursor: Option<&PageCursor>,
        limit: usize,
    ) -> Result<Vec<ChangedRow>, CatalogError>;

    /// Fully denormalized aggregates for the given film ids, one row per film.
    ///
    /// Ids that no longer exist are skipped.
    async fn aggregate_rows(&self, film_ids: &[Uuid]) -> Result<Vec<AggregateRow>, CatalogError>;
}
