//! Error types for the relational catalog.
//! Defines the errors that can occur while reading changes and aggregates.
use thiserror::Error;

/// Represents errors that can occur within the catalog repository.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// A row did not have the shape the pipeline expects.
    #[error("Invalid row: {0}")]
    InvalidRow(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
}

impl CatalogError {
    /// Create an invalid row error.
    pub fn invalid_row(msg: impl Into<String>) -> Self {
        Self::InvalidRow(msg.into())
    }

    /// Whether the error is a loss of connectivity to the database.
    ///
    /// Covers socket and TLS failures, pool exhaustion or closure, and
    /// server-reported SQLSTATE class `08` (connection exception) and
    /// `57P0x` (operator intervention, e.g. shutdown).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::DatabaseError(err) => match err {
                sqlx::Error::Io(_)
                | sqlx::Error::Tls(_)
                | sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::WorkerCrashed => true,
                sqlx::Error::Database(db) => db
                    .code()
                    .map(|code| code.starts_with("08") || code.starts_with("57P0"))
                    .unwrap_or(false),
                _ => false,
            },
            Self::InvalidRow(_) | Self::InvalidIdentifier(_) => false,
        }
    }
}
