//! Checkpoint store implementations.
//!
//! - [`JsonFileCheckpointStore`]: the production store, a single JSON object
//!   mapping watermark keys to timestamps
//! - [`InMemoryCheckpointStore`]: a volatile store for tests and dry runs

mod json_file;
mod memory;

pub use json_file::JsonFileCheckpointStore;
pub use memory::InMemoryCheckpointStore;
