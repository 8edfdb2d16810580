use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::errors::CheckpointError;
use crate::interfaces::CheckpointStore;

/// Volatile checkpoint store with the same monotonic guard as the file store.
#[derive(Default)]
pub struct InMemoryCheckpointStore {
    state: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored watermark.
    pub async fn snapshot(&self) -> HashMap<String, DateTime<Utc>> {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn get(&self, key: &str) -> Result<Option<DateTime<Utc>>, CheckpointError> {
        Ok(self.state.lock().await.get(key).copied())
    }

    async fn set(&self, key: &str, value: DateTime<Utc>) -> Result<bool, CheckpointError> {
        let mut state = self.state.lock().await;
        match state.get(key) {
            Some(current) if value <= *current => Ok(false),
            _ => {
                state.insert(key.to_string(), value);
                Ok(true)
            }
        }
    }
}
