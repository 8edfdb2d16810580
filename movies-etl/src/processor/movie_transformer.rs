//! Movie transformer implementation.
//!
//! Transforms `AggregateRow`s into `MovieDocument`s for indexing.

use movies_etl_shared::{AggregateRow, FilmType, MovieDocument, Role};
use tracing::{debug, Instrument, Span};

use crate::errors::IngestError;
use crate::loader::{DocumentBatch, Indexer};

/// Aggregates produced from one page of film ids.
#[derive(Debug, Clone, Default)]
pub struct AggregateBatch {
    pub rows: Vec<AggregateRow>,
}

/// Build the index document of one film aggregate.
///
/// Participations are split by role in their input order. Directors only
/// contribute names; actors and writers contribute both names and `{id, name}`
/// objects.
pub fn transform(row: AggregateRow) -> MovieDocument {
    let mut director = Vec::new();
    let mut actors = Vec::new();
    let mut writers = Vec::new();

    for participation in &row.persons {
        match participation.role {
            Role::Director => director.push(participation.name.clone()),
            Role::Actor => actors.push(participation.person()),
            Role::Writer => writers.push(participation.person()),
        }
    }

    MovieDocument {
        id: row.id,
        imdb_rating: row.rating,
        title: row.title,
        description: row.description,
        genre: row.genres.into_iter().map(|genre| genre.name).collect(),
        actors_names: actors.iter().map(|p| p.name.clone()).collect(),
        writers_names: writers.iter().map(|p| p.name.clone()).collect(),
        director,
        actors,
        writers,
    }
}

/// Transformer stage: maps every aggregate of a batch to its document.
pub struct MovieTransformer {
    next: Indexer,
    span: Span,
}

impl MovieTransformer {
    pub fn new(next: Indexer, span: Span) -> Self {
        Self { next, span }
    }

    /// Transform a batch and hand it to the indexer, returning its verdict.
    pub async fn push(&self, batch: AggregateBatch) -> Result<bool, IngestError> {
        let documents: Vec<MovieDocument> = {
            let _entered = self.span.enter();
            let tv_shows = batch
                .rows
                .iter()
                .filter(|row| row.film_type == FilmType::TvShow)
                .count();
            let documents: Vec<MovieDocument> = batch.rows.into_iter().map(transform).collect();
            debug!(
                document_count = documents.len(),
                tv_shows = tv_shows,
                "Transformed aggregates"
            );
            documents
        };

        self.next
            .push(DocumentBatch { documents })
            .instrument(self.span.clone())
            .await
    }
}
