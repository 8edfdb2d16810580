//! Error types for the movies ETL repository.
//!
//! One error type per external collaborator.

mod catalog_error;
mod checkpoint_error;
mod search_index_error;

pub use catalog_error::CatalogError;
pub use checkpoint_error::CheckpointError;
pub use search_index_error::SearchIndexError;
