//! # Movies ETL Shared
//!
//! This crate defines the data structures passed between the stages of the
//! movies search ETL: changed-row markers read from the relational catalog,
//! denormalized film aggregates, and the documents written to the search index.

pub mod types;

pub use types::aggregate::{AggregateRow, FilmType, GenreRef, Participation, PersonRef, Role};
pub use types::changes::{ChangedRow, PageCursor, TrackedTable};
pub use types::movie_document::MovieDocument;
