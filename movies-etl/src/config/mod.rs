//! Configuration loading and dependency wiring.

mod dependencies;
mod settings;

pub use dependencies::{build_pipeline, Dependencies};
pub use settings::{CheckpointKeying, ConnectionMode, EtlConfig, LogFormat, DEFAULT_STATE_KEY};
