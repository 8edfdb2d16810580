//! Watermark bookkeeping for the pipeline.
//!
//! The [`CheckpointWriter`] receives candidate watermarks from the extractor
//! together with the indexing verdict and writes them to the
//! [`CheckpointStore`] only if the pages behind them were indexed cleanly.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use movies_etl_repository::CheckpointStore;
use movies_etl_shared::TrackedTable;
use tracing::{debug, info, Instrument, Span};

use crate::config::CheckpointKeying;
use crate::errors::IngestError;
use crate::stats::PipelineStats;

/// Candidate watermark carried alongside a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    /// Table whose scan produced the batch.
    pub table: TrackedTable,
    /// `updated_at` of the last row of the extractor page.
    pub value: DateTime<Utc>,
}

/// The timestamp a scan starts from when no watermark is stored yet.
pub fn earliest_watermark() -> DateTime<Utc> {
    // 0001-01-01T00:00:00Z
    DateTime::from_timestamp(-62_135_596_800, 0).unwrap_or_default()
}

/// Maps tracked tables to checkpoint store keys.
#[derive(Debug, Clone)]
pub struct WatermarkKeys {
    key: String,
    keying: CheckpointKeying,
}

impl WatermarkKeys {
    pub fn new(key: impl Into<String>, keying: CheckpointKeying) -> Self {
        Self {
            key: key.into(),
            keying,
        }
    }

    /// The store key holding the watermark of `table`.
    pub fn key_for(&self, table: TrackedTable) -> String {
        match self.keying {
            CheckpointKeying::Shared => self.key.clone(),
            CheckpointKeying::PerTable => format!("{}:{}", self.key, table.table_name()),
        }
    }

    /// Whether every table shares one watermark.
    pub fn is_shared(&self) -> bool {
        self.keying == CheckpointKeying::Shared
    }
}

/// Reads watermarks for the orchestrator and writes them after indexed batches.
pub struct CheckpointWriter {
    store: Arc<dyn CheckpointStore>,
    keys: WatermarkKeys,
    stats: Arc<PipelineStats>,
    span: Span,
}

impl CheckpointWriter {
    pub fn new(
        store: Arc<dyn CheckpointStore>,
        keys: WatermarkKeys,
        stats: Arc<PipelineStats>,
        span: Span,
    ) -> Self {
        Self {
            store,
            keys,
            stats,
            span,
        }
    }

    pub fn keys(&self) -> &WatermarkKeys {
        &self.keys
    }

    /// Current watermark of `table`, or `None` if nothing was stored yet.
    pub async fn watermark(&self, table: TrackedTable) -> Result<Option<DateTime<Utc>>, IngestError> {
        Ok(self.store.get(&self.keys.key_for(table)).await?)
    }

    /// Apply `checkpoint` if `indexed_ok`.
    ///
    /// Returns whether the store accepted the value. Values that do not
    /// advance the stored watermark are dropped by the store.
    pub async fn push(&self, checkpoint: Checkpoint, indexed_ok: bool) -> Result<bool, IngestError> {
        self.apply(checkpoint, indexed_ok)
            .instrument(self.span.clone())
            .await
    }

    async fn apply(&self, checkpoint: Checkpoint, indexed_ok: bool) -> Result<bool, IngestError> {
        let key = self.keys.key_for(checkpoint.table);

        if !indexed_ok {
            info!(
                key = %key,
                table = %checkpoint.table,
                withheld = %checkpoint.value,
                "Batch not fully indexed, keeping watermark"
            );
            return Ok(false);
        }

        let applied = self.store.set(&key, checkpoint.value).await?;
        if applied {
            self.stats.record_checkpoint();
            info!(key = %key, value = %checkpoint.value, "Saved watermark");
        } else {
            debug!(key = %key, value = %checkpoint.value, "Watermark already at or past value");
        }
        Ok(applied)
    }
}
