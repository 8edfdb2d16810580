//! Index configuration and mappings.
//!
//! This module defines the index settings and mappings for the movies index.
//! A deployment may replace them with its own schema file.

use std::path::Path;

use serde_json::{json, Value};

use crate::errors::SearchIndexError;

/// The default name of the movies index.
pub const INDEX_NAME: &str = "movies";

/// Configuration for the search index.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// The index name used for all operations.
    pub name: String,
    /// Settings and mappings used when the index has to be created.
    pub settings: Value,
}

impl IndexConfig {
    /// Create a configuration using the built-in movies mapping.
    ///
    /// # Arguments
    ///
    /// * `name` - The index name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            settings: get_index_settings(),
        }
    }

    /// Create a configuration whose settings and mappings are read from a JSON file.
    ///
    /// # Arguments
    ///
    /// * `name` - The index name
    /// * `schema_path` - Path to a JSON document with `settings` and `mappings`
    ///
    /// # Returns
    ///
    /// * `Ok(IndexConfig)` - Configuration holding the file's contents
    /// * `Err(SearchIndexError)` - If the file cannot be read or is not a JSON object
    pub async fn from_schema_file(
        name: impl Into<String>,
        schema_path: &Path,
    ) -> Result<Self, SearchIndexError> {
        let contents = tokio::fs::read_to_string(schema_path).await.map_err(|e| {
            SearchIndexError::validation(format!(
                "Cannot read index schema {}: {}",
                schema_path.display(),
                e
            ))
        })?;
        let settings: Value = serde_json::from_str(&contents)
            .map_err(|e| SearchIndexError::parse(format!("Invalid index schema: {}", e)))?;

        if !settings.is_object() {
            return Err(SearchIndexError::validation(
                "Index schema must be a JSON object",
            ));
        }

        Ok(Self {
            name: name.into(),
            settings,
        })
    }
}

/// Get the index settings and mappings for the movies index.
///
/// The configuration includes:
/// - **ru_en analyzer**: English and Russian stemming with stop words for titles and descriptions
/// - **Keyword fields**: For filtering and exact ID lookups
/// - **Nested person objects**: `actors` and `writers` as `{id, name}` pairs
///
/// `mappings.dynamic` is `strict`: documents carrying unknown fields are rejected.
pub fn get_index_settings() -> Value {
    json!({
        "settings": {
            "refresh_interval": "1s",
            "analysis": {
                "filter": {
                    "english_stop": { "type": "stop", "stopwords": "_english_" },
                    "english_stemmer": { "type": "stemmer", "language": "english" },
                    "english_possessive_stemmer": { "type": "stemmer", "language": "possessive_english" },
                    "russian_stop": { "type": "stop", "stopwords": "_russian_" },
                    "russian_stemmer": { "type": "stemmer", "language": "russian" }
                },
                "analyzer": {
                    "ru_en": {
                        "tokenizer": "standard",
                        "filter": [
                            "lowercase",
                            "english_stop",
                            "english_stemmer",
                            "english_possessive_stemmer",
                            "russian_stop",
                            "russian_stemmer"
                        ]
                    }
                }
            }
        },
        "mappings": {
            "dynamic": "strict",
            "properties": {
                "id": { "type": "keyword" },
                "imdb_rating": { "type": "float" },
                "genre": { "type": "keyword" },
                "title": {
                    "type": "text",
                    "analyzer": "ru_en",
                    "fields": { "raw": { "type": "keyword" } }
                },
                "description": { "type": "text", "analyzer": "ru_en" },
                "director": { "type": "text", "analyzer": "ru_en" },
                "actors_names": { "type": "text", "analyzer": "ru_en" },
                "writers_names": { "type": "text", "analyzer": "ru_en" },
                "actors": {
                    "type": "nested",
                    "dynamic": "strict",
                    "properties": {
                        "id": { "type": "keyword" },
                        "name": { "type": "text", "analyzer": "ru_en" }
                    }
                },
                "writers": {
                    "type": "nested",
                    "dynamic": "strict",
                    "properties": {
                        "id": { "type": "keyword" },
                        "name": { "type": "text", "analyzer": "ru_en" }
                    }
                }
            }
        }
    })
}
