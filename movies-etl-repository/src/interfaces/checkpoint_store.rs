use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::CheckpointError;

/// Durable, monotonic watermark storage keyed by watermark name.
///
/// `set` applies a value only if it is strictly greater than the stored value
/// for the key, or if nothing is stored yet. Any other call is a silent no-op.
/// Implementations are not required to support concurrent writers.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Returns the stored watermark for `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<DateTime<Utc>>, CheckpointError>;

    /// Proposes a new watermark for `key`.
    ///
    /// Returns `true` if the value was applied and persisted.
    async fn set(&self, key: &str, value: DateTime<Utc>) -> Result<bool, CheckpointError>;
}
