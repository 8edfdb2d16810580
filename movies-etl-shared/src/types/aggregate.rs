//! Denormalized film aggregates produced by the merge query.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of a film work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilmType {
    Movie,
    TvShow,
}

impl FilmType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilmType::Movie => "movie",
            FilmType::TvShow => "tv_show",
        }
    }
}

impl fmt::Display for FilmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilmType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(FilmType::Movie),
            "tv_show" => Ok(FilmType::TvShow),
            other => Err(format!("unknown film type '{}'", other)),
        }
    }
}

/// Role a person holds on a film.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Director,
    Writer,
    Actor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Director => "director",
            Role::Writer => "writer",
            Role::Actor => "actor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Genre reference embedded in an aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenreRef {
    pub id: Uuid,
    pub name: String,
}

/// Person reference as written to the index (`{id, name}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersonRef {
    pub id: Uuid,
    pub name: String,
}

/// One person-film participation in a given role.
///
/// A person holding several roles on the same film yields one participation
/// per role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participation {
    pub id: Uuid,
    pub name: String,
    pub role: Role,
}

impl Participation {
    pub fn person(&self) -> PersonRef {
        PersonRef {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// One film work with its genres and participations, de-duplicated by identity.
///
/// Empty genre or participation groups are empty vectors, never absent.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub id: Uuid,
    pub rating: Option<f64>,
    pub title: String,
    pub description: Option<String>,
    pub film_type: FilmType,
    pub genres: Vec<GenreRef>,
    pub persons: Vec<Participation>,
}
