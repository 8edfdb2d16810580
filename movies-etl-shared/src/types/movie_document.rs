//! Movie document types for the search index.
//!
//! This module defines the document structure that is indexed in the search engine.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::aggregate::PersonRef;

/// Document representation for the `movies` index.
///
/// This struct is the indexable projection of one film aggregate. Each bulk
/// write replaces any stored document with the same `id`.
///
/// # Fields
///
/// - `id`: Film work identifier, also used as the index document id
/// - `imdb_rating`: Optional rating
/// - `title`: Film title
/// - `description`: Optional description text
/// - `genre`: Genre names
/// - `actors_names` / `writers_names` / `director`: Flat name lists per role
/// - `actors` / `writers`: `{id, name}` objects per role
///
/// Directors are only emitted as a name list. Index consumers depend on this
/// shape, so there is no `directors` object list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDocument {
    pub id: Uuid,
    pub imdb_rating: Option<f64>,
    pub title: String,
    pub description: Option<String>,
    pub genre: Vec<String>,
    pub actors_names: Vec<String>,
    pub writers_names: Vec<String>,
    pub director: Vec<String>,
    pub actors: Vec<PersonRef>,
    pub writers: Vec<PersonRef>,
}

impl MovieDocument {
    /// Generate the document ID used in the search index.
    pub fn document_id(&self) -> String {
        self.id.to_string()
    }
}
