//! This module defines the core data structures used across the movies ETL.
//! It re-exports the change markers, film aggregates and index documents.

pub mod aggregate;
pub mod changes;
pub mod movie_document;

pub use aggregate::{AggregateRow, FilmType, GenreRef, Participation, PersonRef, Role};
pub use changes::{ChangedRow, PageCursor, TrackedTable};
pub use movie_document::MovieDocument;
