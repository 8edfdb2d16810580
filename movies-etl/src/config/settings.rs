//! Runtime settings read from the environment.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use movies_etl_repository::opensearch::INDEX_NAME;
use sqlx::postgres::PgConnectOptions;
use tracing::warn;

use crate::IndexingError;

/// Default shared watermark key.
pub const DEFAULT_STATE_KEY: &str = "last_movies_updated";

/// How watermarks are keyed in the checkpoint store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointKeying {
    /// One key for every tracked table.
    Shared,
    /// One key per tracked table, `<key>:<table>`.
    PerTable,
}

impl FromStr for CheckpointKeying {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "shared" => Ok(Self::Shared),
            "per-table" | "per_table" | "pertable" => Ok(Self::PerTable),
            other => Err(format!(
                "unknown checkpoint keying '{}', expected 'shared' or 'per-table'",
                other
            )),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "unknown log format '{}', expected 'pretty' or 'json'",
                other
            )),
        }
    }
}

/// Connection mode for the search engine at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if the index cannot be provisioned.
    FailFast,
    /// Retry provisioning at a fixed interval until it succeeds.
    Retry,
}

impl ConnectionMode {
    /// Valid values: "fail-fast" or "retry" (case-insensitive).
    /// Anything else falls back to "retry" with a warning.
    fn parse_or_default(value: Option<String>) -> Self {
        match value
            .unwrap_or_else(|| "retry".to_string())
            .to_lowercase()
            .as_str()
        {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            _ => {
                warn!("Invalid OPENSEARCH_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }
}

/// Every setting the ETL process needs.
#[derive(Clone)]
pub struct EtlConfig {
    pub database: PgConnectOptions,
    pub db_schema: String,
    pub search_url: String,
    pub index_name: String,
    pub index_schema_path: Option<PathBuf>,
    pub refresh_interval: Duration,
    pub page_size: usize,
    pub state_path: PathBuf,
    pub state_key: String,
    pub checkpoint_keying: CheckpointKeying,
    pub retry_delay: Duration,
    pub retry_max_attempts: usize,
    pub connection_mode: ConnectionMode,
    pub connection_retry_interval: Duration,
    pub log_format: LogFormat,
}

impl fmt::Debug for EtlConfig {
    // PgConnectOptions carries the password.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EtlConfig")
            .field("db_host", &self.database.get_host())
            .field("db_port", &self.database.get_port())
            .field("db_name", &self.database.get_database())
            .field("db_schema", &self.db_schema)
            .field("search_url", &self.search_url)
            .field("index_name", &self.index_name)
            .field("index_schema_path", &self.index_schema_path)
            .field("refresh_interval", &self.refresh_interval)
            .field("page_size", &self.page_size)
            .field("state_path", &self.state_path)
            .field("state_key", &self.state_key)
            .field("checkpoint_keying", &self.checkpoint_keying)
            .field("retry_delay", &self.retry_delay)
            .field("retry_max_attempts", &self.retry_max_attempts)
            .field("connection_mode", &self.connection_mode)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl EtlConfig {
    /// Read the configuration from process environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DATABASE_URL`: Full PostgreSQL URL; overrides the `DB_*` variables
    /// - `DB_NAME`, `POSTGRES_USER`, `POSTGRES_PASSWORD`, `DB_HOST`, `DB_PORT`:
    ///   Connection parameters (default: movies_database, app, empty, 127.0.0.1, 5432)
    /// - `DB_SCHEMA`: Schema of the catalog tables (default: content)
    /// - `ELASTIC_HOST`, `ELASTIC_PORT`: Search engine address (default: 127.0.0.1:9200)
    /// - `INDEX_NAME`: Target index (default: movies)
    /// - `INDEX_SCHEMA_PATH`: Index settings and mappings file (default: built-in mapping)
    /// - `REFRESH_INTERVAL_SECS`: Idle time between sweeps (default: 10)
    /// - `PAGE_SIZE`: Rows per page in every stage (default: 100)
    /// - `STATE_PATH`: Checkpoint file (default: storage.json)
    /// - `STATE_KEY`: Watermark key (default: last_movies_updated)
    /// - `CHECKPOINT_KEYING`: "shared" or "per-table" (default: shared)
    /// - `RETRY_DELAY_SECS`: Delay between sweep attempts (default: 10)
    /// - `RETRY_MAX_ATTEMPTS`: Sweep attempt budget (default: 1000)
    /// - `OPENSEARCH_CONNECTION_MODE`: "fail-fast" or "retry" (default: retry)
    /// - `OPENSEARCH_RETRY_INTERVAL_SECS`: Startup retry interval (default: 15)
    /// - `LOG_FORMAT`: "pretty" or "json" (default: pretty)
    pub fn from_env() -> Result<Self, IndexingError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, IndexingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let database = match lookup("DATABASE_URL") {
            Some(url) => PgConnectOptions::from_str(&url)
                .map_err(|e| IndexingError::config(format!("Invalid DATABASE_URL: {}", e)))?,
            None => PgConnectOptions::new()
                .host(&var("DB_HOST", "127.0.0.1"))
                .port(parse_number(&lookup, "DB_PORT", 5432u16)?)
                .username(&var("POSTGRES_USER", "app"))
                .password(&var("POSTGRES_PASSWORD", ""))
                .database(&var("DB_NAME", "movies_database")),
        };

        let search_url = format!(
            "http://{}:{}",
            var("ELASTIC_HOST", "127.0.0.1"),
            parse_number(&lookup, "ELASTIC_PORT", 9200u16)?
        );

        let page_size = parse_number(&lookup, "PAGE_SIZE", 100usize)?;
        if page_size == 0 {
            return Err(IndexingError::config("PAGE_SIZE must be greater than zero"));
        }

        let retry_max_attempts = parse_number(&lookup, "RETRY_MAX_ATTEMPTS", 1000usize)?;
        if retry_max_attempts == 0 {
            return Err(IndexingError::config(
                "RETRY_MAX_ATTEMPTS must be greater than zero",
            ));
        }

        Ok(Self {
            database,
            db_schema: var("DB_SCHEMA", "content"),
            search_url,
            index_name: var("INDEX_NAME", INDEX_NAME),
            index_schema_path: lookup("INDEX_SCHEMA_PATH").map(PathBuf::from),
            refresh_interval: Duration::from_secs(parse_number(
                &lookup,
                "REFRESH_INTERVAL_SECS",
                10u64,
            )?),
            page_size,
            state_path: PathBuf::from(var("STATE_PATH", "storage.json")),
            state_key: var("STATE_KEY", DEFAULT_STATE_KEY),
            checkpoint_keying: parse_enum(&lookup, "CHECKPOINT_KEYING", CheckpointKeying::Shared)?,
            retry_delay: Duration::from_secs(parse_number(&lookup, "RETRY_DELAY_SECS", 10u64)?),
            retry_max_attempts,
            connection_mode: ConnectionMode::parse_or_default(lookup("OPENSEARCH_CONNECTION_MODE")),
            connection_retry_interval: Duration::from_secs(parse_number(
                &lookup,
                "OPENSEARCH_RETRY_INTERVAL_SECS",
                15u64,
            )?),
            log_format: parse_enum(&lookup, "LOG_FORMAT", LogFormat::Pretty)?,
        })
    }
}

fn parse_number<F, T>(lookup: &F, key: &str, default: T) -> Result<T, IndexingError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| IndexingError::config(format!("Invalid {} '{}': {}", key, raw, e))),
        None => Ok(default),
    }
}

fn parse_enum<F, T>(lookup: &F, key: &str, default: T) -> Result<T, IndexingError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr<Err = String>,
{
    match lookup(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| IndexingError::config(format!("Invalid {}: {}", key, e))),
        None => Ok(default),
    }
}
