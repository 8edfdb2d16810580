//! Processor module for the movies ETL pipeline.
//!
//! Transforms merged film aggregates into search documents.

mod movie_transformer;

pub use movie_transformer::{transform, AggregateBatch, MovieTransformer};
