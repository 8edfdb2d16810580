//! JSON file implementation of the checkpoint store.
//!
//! Stores every watermark in one JSON object, e.g.
//! `{"last_movies_updated": "2024-03-01T12:00:00.000000Z"}`, so the indexer can
//! resume after restarts.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::errors::CheckpointError;
use crate::interfaces::CheckpointStore;

/// File-backed checkpoint store.
///
/// The file is read once when the store is opened and rewritten on every
/// accepted `set`. Writes go to a sibling `.tmp` file which is synced to disk
/// and then renamed over the checkpoint file.
pub struct JsonFileCheckpointStore {
    path: PathBuf,
    state: Mutex<BTreeMap<String, DateTime<Utc>>>,
}

impl JsonFileCheckpointStore {
    /// Opens the store at `path`, loading any watermarks already persisted.
    ///
    /// A missing or empty file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`CheckpointError`] if the file cannot be read, is not a JSON
    /// object of strings, or holds a value that is not a timestamp.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, CheckpointError> {
        let path = path.into();
        let state = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => parse_state(&contents)?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        info!(
            path = %path.display(),
            keys = state.len(),
            "Opened checkpoint store"
        );

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Path of the checkpoint file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, state: &BTreeMap<String, DateTime<Utc>>) -> Result<(), CheckpointError> {
        let encoded: BTreeMap<&str, String> = state
            .iter()
            .map(|(key, value)| {
                (
                    key.as_str(),
                    value.to_rfc3339_opts(SecondsFormat::Micros, true),
                )
            })
            .collect();
        let bytes = serde_json::to_vec(&encoded)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp, &self.path).await?;

        Ok(())
    }
}

/// Accepts RFC 3339 timestamps as well as the space-separated form
/// (`2023-06-16 20:14:09.221837+00:00`).
fn parse_state(contents: &str) -> Result<BTreeMap<String, DateTime<Utc>>, CheckpointError> {
    if contents.trim().is_empty() {
        return Ok(BTreeMap::new());
    }

    let raw: BTreeMap<String, String> = serde_json::from_str(contents)?;
    raw.into_iter()
        .map(|(key, value)| match value.parse::<DateTime<Utc>>() {
            Ok(ts) => Ok((key, ts)),
            Err(_) => Err(CheckpointError::InvalidTimestamp { key, value }),
        })
        .collect()
}

#[async_trait]
impl CheckpointStore for JsonFileCheckpointStore {
    async fn get(&self, key: &str) -> Result<Option<DateTime<Utc>>, CheckpointError> {
        Ok(self.state.lock().await.get(key).copied())
    }

    async fn set(&self, key: &str, value: DateTime<Utc>) -> Result<bool, CheckpointError> {
        let mut state = self.state.lock().await;

        if let Some(current) = state.get(key) {
            if value <= *current {
                debug!(key = %key, current = %current, proposed = %value, "Ignoring non-advancing checkpoint");
                return Ok(false);
            }
        }

        let mut next = state.clone();
        next.insert(key.to_string(), value);
        self.persist(&next).await?;
        *state = next;

        Ok(true)
    }
}
