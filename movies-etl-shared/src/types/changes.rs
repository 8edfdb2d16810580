//! Change markers read from the relational catalog.
//!
//! Every tracked table exposes an `updated_at` column. The extractor scans it
//! in ascending order and hands `ChangedRow`s downstream in fixed-size pages.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog table whose changes are propagated to the search index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedTable {
    /// The root aggregate table. Its ids are document ids.
    FilmWork,
    /// Genres, linked to films through `genre_film_work`.
    Genre,
    /// People, linked to films through `person_film_work`.
    Person,
}

impl TrackedTable {
    /// Sweep order used by the orchestrator.
    pub const ALL: [TrackedTable; 3] = [
        TrackedTable::FilmWork,
        TrackedTable::Genre,
        TrackedTable::Person,
    ];

    /// Returns the table name in the catalog schema.
    pub fn table_name(&self) -> &'static str {
        match self {
            TrackedTable::FilmWork => "film_work",
            TrackedTable::Genre => "genre",
            TrackedTable::Person => "person",
        }
    }

    /// Whether rows of this table are root aggregates themselves.
    pub fn is_root(&self) -> bool {
        matches!(self, TrackedTable::FilmWork)
    }

    /// Join table and foreign key column linking a child table to `film_work`.
    ///
    /// Returns `None` for the root table.
    pub fn link(&self) -> Option<(&'static str, &'static str)> {
        match self {
            TrackedTable::FilmWork => None,
            TrackedTable::Genre => Some(("genre_film_work", "genre_id")),
            TrackedTable::Person => Some(("person_film_work", "person_id")),
        }
    }
}

impl fmt::Display for TrackedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Identifier and change timestamp of a row that changed after a watermark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedRow {
    pub id: Uuid,
    pub updated_at: DateTime<Utc>,
}

impl ChangedRow {
    pub fn new(id: Uuid, updated_at: DateTime<Utc>) -> Self {
        Self { id, updated_at }
    }
}

/// Keyset position for paginated scans ordered by `(updated_at, id)`.
///
/// A cursor without an id is the start of a scan: it matches every row whose
/// `updated_at` is strictly greater than the timestamp. A cursor with an id is
/// a continuation: it matches rows sorting strictly after `(updated_at, id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub updated_at: DateTime<Utc>,
    pub id: Option<Uuid>,
}

impl PageCursor {
    /// Cursor for the first page of a scan starting after `since`.
    pub fn since(since: DateTime<Utc>) -> Self {
        Self {
            updated_at: since,
            id: None,
        }
    }

    /// Cursor positioned after the given row.
    pub fn after(row: &ChangedRow) -> Self {
        Self {
            updated_at: row.updated_at,
            id: Some(row.id),
        }
    }

    /// Whether `row` lies strictly after this cursor in `(updated_at, id)` order.
    pub fn admits(&self, row: &ChangedRow) -> bool {
        match self.id {
            None => row.updated_at > self.updated_at,
            Some(id) => (row.updated_at, row.id) > (self.updated_at, id),
        }
    }
}
