//! Orchestrator module for the movies ETL pipeline.
//!
//! Drives periodic sweeps over every tracked table and wraps the
//! sweep-and-wait loop in a constant-delay retry policy with a bounded number
//! of attempts.

use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use movies_etl_shared::TrackedTable;
use tokio::sync::watch;
use tokio::time::sleep;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;
use tracing::{error, info, warn, Instrument, Span};

use crate::checkpoint::{earliest_watermark, CheckpointWriter};
use crate::errors::IngestError;
use crate::extractor::{Extractor, SweepRequest};
use crate::stats::{PipelineStats, SweepStats};

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Idle time between two sweeps.
    pub refresh_interval: Duration,
    /// Constant delay before a failed attempt is retried.
    pub retry_delay: Duration,
    /// Total number of attempts before giving up, counting the first one.
    pub max_attempts: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(10),
            retry_delay: Duration::from_secs(10),
            max_attempts: 1000,
        }
    }
}

/// Observable state of the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Sweeping,
    Idle,
}

/// Orchestrator that drives the pipeline.
///
/// The orchestrator:
/// - Sweeps the tracked tables one at a time, in a fixed order
/// - Starts each table from its watermark, or from the earliest timestamp
/// - Idles between sweeps
/// - Retries the whole loop after any failure until the attempt budget is spent
pub struct Orchestrator {
    extractor: Extractor,
    checkpoints: Arc<CheckpointWriter>,
    stats: Arc<PipelineStats>,
    config: OrchestratorConfig,
    state_tx: watch::Sender<OrchestratorState>,
    span: Span,
}

impl Orchestrator {
    /// Create a new orchestrator on top of a wired stage chain.
    pub fn new(
        extractor: Extractor,
        checkpoints: Arc<CheckpointWriter>,
        stats: Arc<PipelineStats>,
        config: OrchestratorConfig,
        span: Span,
    ) -> Self {
        let (state_tx, _) = watch::channel(OrchestratorState::Idle);

        Self {
            extractor,
            checkpoints,
            stats,
            config,
            state_tx,
            span,
        }
    }

    /// Current state.
    pub fn state(&self) -> OrchestratorState {
        *self.state_tx.borrow()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<OrchestratorState> {
        self.state_tx.subscribe()
    }

    /// Run one sweep over every tracked table.
    ///
    /// Returns the counters of this sweep. On error the sweep is abandoned
    /// where it failed; watermarks saved so far stay saved.
    pub async fn sweep(&self) -> Result<SweepStats, IngestError> {
        self.stats.take();
        self.state_tx.send_replace(OrchestratorState::Sweeping);

        let result = self.sweep_tables().instrument(self.span.clone()).await;

        self.state_tx.send_replace(OrchestratorState::Idle);
        let stats = self.stats.take();

        info!(
            parent: &self.span,
            pages_extracted = stats.pages_extracted,
            ids_enriched = stats.ids_enriched,
            rows_merged = stats.rows_merged,
            documents_indexed = stats.documents_indexed,
            batches_failed = stats.batches_failed,
            checkpoints_saved = stats.checkpoints_saved,
            "Sweep finished"
        );

        result.map(|()| stats)
    }

    async fn sweep_tables(&self) -> Result<(), IngestError> {
        for table in TrackedTable::ALL {
            let since = self
                .checkpoints
                .watermark(table)
                .await?
                .unwrap_or_else(earliest_watermark);
            info!(table = %table, since = %since, "Starting the ETL process for the table");

            let outcome = self.extractor.push(SweepRequest { table, since }).await?;

            if !outcome.completed && self.checkpoints.keys().is_shared() {
                // A later table could advance the shared watermark past the failed rows.
                warn!(
                    table = %table,
                    "Ending sweep early to keep the shared watermark behind the failed batch"
                );
                break;
            }
        }

        Ok(())
    }

    /// Sweep, idle, repeat. Only returns on error.
    async fn sweep_loop(&self) -> Result<Infallible, IngestError> {
        loop {
            self.sweep().await?;
            sleep(self.config.refresh_interval).await;
        }
    }

    async fn attempt(&self, attempts: &AtomicUsize) -> Result<Infallible, IngestError> {
        let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;

        let err = match self.sweep_loop().await {
            Ok(never) => match never {},
            Err(e) => e,
        };

        if err.is_transient() {
            warn!(
                parent: &self.span,
                attempt = attempt,
                max_attempts = self.config.max_attempts,
                retry_delay_secs = self.config.retry_delay.as_secs(),
                error = %err,
                "Lost connection, retrying sweep"
            );
        } else {
            error!(
                parent: &self.span,
                attempt = attempt,
                max_attempts = self.config.max_attempts,
                error = %err,
                "Sweep attempt failed"
            );
        }
        Err(err)
    }

    /// Run sweeps until the retry budget is exhausted.
    ///
    /// Never returns `Ok`: the process is expected to be stopped externally.
    /// Attempts are counted over the lifetime of the call, not reset by a
    /// successful sweep.
    pub async fn run(&self) -> Result<(), IngestError> {
        info!(
            refresh_interval_secs = self.config.refresh_interval.as_secs(),
            retry_delay_secs = self.config.retry_delay.as_secs(),
            max_attempts = self.config.max_attempts,
            "Starting movies ETL orchestrator"
        );

        let counter = AtomicUsize::new(0);
        let attempts = &counter;
        let strategy = FixedInterval::new(self.config.retry_delay)
            .take(self.config.max_attempts.saturating_sub(1));

        match Retry::spawn(strategy, move || self.attempt(attempts)).await {
            Ok(never) => match never {},
            Err(last_error) => {
                let attempts = counter.load(Ordering::SeqCst);
                error!(attempts = attempts, error = %last_error, "Retry budget exhausted");
                Err(IngestError::RetryBudgetExhausted {
                    attempts,
                    last_error: Box::new(last_error),
                })
            }
        }
    }
}
