//! # Movies ETL
//!
//! Incrementally synchronizes the PostgreSQL movie catalog into the `movies`
//! search index.
//!
//! ## Architecture
//!
//! Stages are chained by construction, each handing one page at a time to the
//! next and waiting for it to return:
//!
//! 1. **Extractor**: Scans a table for rows changed after its watermark
//! 2. **Enricher**: Maps changed genres and persons to the films referencing them
//! 3. **Merger**: Loads denormalized film aggregates
//! 4. **Transformer**: Builds index documents from aggregates
//! 5. **Indexer**: Bulk-upserts documents into the search index
//! 6. **CheckpointWriter**: Advances the watermark once a page is fully indexed
//!
//! The **Orchestrator** sweeps every table periodically and retries failed
//! sweeps under a bounded, constant-delay policy.
//!
//! ## Modules
//!
//! - [`config`]: Settings and dependency initialization
//! - [`extractor`], [`enricher`], [`merger`], [`processor`], [`loader`]: Pipeline stages
//! - [`checkpoint`]: Watermark keys and the checkpoint writer
//! - [`orchestrator`]: Sweep scheduling and retry policy
//! - [`stats`]: Per-sweep counters
//! - [`errors`]: Error types for the pipeline

pub mod checkpoint;
pub mod config;
pub mod enricher;
pub mod errors;
pub mod extractor;
pub mod loader;
pub mod merger;
pub mod orchestrator;
pub mod processor;
pub mod stats;

pub use config::{Dependencies, EtlConfig};
pub use errors::IngestError;
pub use orchestrator::{Orchestrator, OrchestratorConfig, OrchestratorState};

use thiserror::Error;

/// Errors that can occur during ETL initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Ingest error.
    #[error("Ingest error: {0}")]
    IngestError(#[from] IngestError),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
