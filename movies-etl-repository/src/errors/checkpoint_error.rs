use thiserror::Error;

#[derive(Debug, Error)]
/// Represents errors that can occur within the checkpoint store.
pub enum CheckpointError {
    #[error("Checkpoint I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Checkpoint encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid checkpoint timestamp for key '{key}': {value}")]
    InvalidTimestamp { key: String, value: String },
}
