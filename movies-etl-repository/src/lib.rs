//! # Movies ETL Repository
//!
//! This crate provides traits and implementations for every external
//! collaborator of the movies ETL: the relational catalog it reads from, the
//! search index it writes to, and the checkpoint store that records progress.
//! It includes definitions for errors, interfaces, and concrete implementations
//! for PostgreSQL, OpenSearch and a JSON checkpoint file.

pub mod checkpoint;
pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod postgres;
pub mod types;
pub mod utils;

pub use checkpoint::{InMemoryCheckpointStore, JsonFileCheckpointStore};
pub use errors::{CatalogError, CheckpointError, SearchIndexError};
pub use interfaces::{CatalogRepository, CheckpointStore, SearchIndexProvider};
pub use opensearch::OpenSearchProvider;
pub use postgres::PostgresCatalogRepository;
pub use types::{BatchOperationResult, BatchOperationSummary};
pub use utils::validate_identifier;
