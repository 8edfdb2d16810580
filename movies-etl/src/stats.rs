//! Counters shared by the pipeline stages.

use std::sync::atomic::{AtomicU64, Ordering};

/// Running counters updated by every stage during a sweep.
#[derive(Debug, Default)]
pub struct PipelineStats {
    pages_extracted: AtomicU64,
    ids_enriched: AtomicU64,
    rows_merged: AtomicU64,
    documents_indexed: AtomicU64,
    batches_failed: AtomicU64,
    checkpoints_saved: AtomicU64,
}

/// Counters of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub pages_extracted: u64,
    pub ids_enriched: u64,
    pub rows_merged: u64,
    pub documents_indexed: u64,
    pub batches_failed: u64,
    pub checkpoints_saved: u64,
}

impl PipelineStats {
    pub fn record_page(&self) {
        self.pages_extracted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_enriched(&self, ids: usize) {
        self.ids_enriched.fetch_add(ids as u64, Ordering::Relaxed);
    }

    pub fn record_merged(&self, rows: usize) {
        self.rows_merged.fetch_add(rows as u64, Ordering::Relaxed);
    }

    pub fn record_indexed(&self, documents: usize) {
        self.documents_indexed
            .fetch_add(documents as u64, Ordering::Relaxed);
    }

    pub fn record_failed_batch(&self) {
        self.batches_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_checkpoint(&self) {
        self.checkpoints_saved.fetch_add(1, Ordering::Relaxed);
    }

    /// Read and reset every counter.
    pub fn take(&self) -> SweepStats {
        SweepStats {
            pages_extracted: self.pages_extracted.swap(0, Ordering::Relaxed),
            ids_enriched: self.ids_enriched.swap(0, Ordering::Relaxed),
            rows_merged: self.rows_merged.swap(0, Ordering::Relaxed),
            documents_indexed: self.documents_indexed.swap(0, Ordering::Relaxed),
            batches_failed: self.batches_failed.swap(0, Ordering::Relaxed),
            checkpoints_saved: self.checkpoints_saved.swap(0, Ordering::Relaxed),
        }
    }
}
