//! Interface definitions for the external collaborators of the ETL.
//!
//! These traits allow dependency injection of the catalog, the search backend
//! and the checkpoint store, so the pipeline can run against mocks in tests.

mod catalog_repository;
mod checkpoint_store;
mod search_index_provider;

pub use catalog_repository::CatalogRepository;
pub use checkpoint_store::CheckpointStore;
pub use search_index_provider::SearchIndexProvider;
