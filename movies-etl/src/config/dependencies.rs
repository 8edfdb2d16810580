//! Dependency initialization and wiring for the movies ETL.

use std::sync::Arc;
use std::time::Duration;

use movies_etl_repository::opensearch::IndexConfig;
use movies_etl_repository::{
    CatalogRepository, CheckpointStore, JsonFileCheckpointStore, OpenSearchProvider,
    PostgresCatalogRepository, SearchIndexProvider,
};
use sqlx::postgres::PgPoolOptions;
use tokio::time::sleep;
use tracing::{info, info_span, warn};

use crate::checkpoint::{CheckpointWriter, WatermarkKeys};
use crate::config::settings::{ConnectionMode, EtlConfig};
use crate::enricher::Enricher;
use crate::extractor::Extractor;
use crate::loader::Indexer;
use crate::merger::Merger;
use crate::orchestrator::{Orchestrator, OrchestratorConfig};
use crate::processor::MovieTransformer;
use crate::stats::PipelineStats;
use crate::IndexingError;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
}

/// Wire the stage chain on top of the given collaborators.
///
/// Every stage gets its own span and all stages share one set of counters.
pub fn build_pipeline(
    catalog: Arc<dyn CatalogRepository>,
    provider: Arc<dyn SearchIndexProvider>,
    checkpoint_store: Arc<dyn CheckpointStore>,
    keys: WatermarkKeys,
    page_size: usize,
    orchestrator_config: OrchestratorConfig,
) -> Orchestrator {
    let stats = Arc::new(PipelineStats::default());

    let checkpoints = Arc::new(CheckpointWriter::new(
        checkpoint_store,
        keys,
        stats.clone(),
        info_span!("checkpoint_writer"),
    ));
    let indexer = Indexer::new(provider, stats.clone(), info_span!("indexer"));
    let transformer = MovieTransformer::new(indexer, info_span!("transformer"));
    let merger = Merger::new(
        catalog.clone(),
        transformer,
        page_size,
        stats.clone(),
        info_span!("merger"),
    );
    let enricher = Enricher::new(
        catalog.clone(),
        merger,
        page_size,
        stats.clone(),
        info_span!("enricher"),
    );
    let extractor = Extractor::new(
        catalog,
        enricher,
        checkpoints.clone(),
        page_size,
        stats.clone(),
        info_span!("extractor"),
    );

    Orchestrator::new(
        extractor,
        checkpoints,
        stats,
        orchestrator_config,
        info_span!("orchestrator"),
    )
}

impl Dependencies {
    /// Initialize all dependencies from the loaded configuration.
    ///
    /// The PostgreSQL pool holds a single, lazily opened connection. The search
    /// index is provisioned before returning; see [`ConnectionMode`] for how
    /// an unreachable search engine is handled here.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If initialization fails (only in fail-fast mode
    ///   for search engine errors)
    pub async fn new(config: &EtlConfig) -> Result<Self, IndexingError> {
        info!(
            db_host = %config.database.get_host(),
            db_port = config.database.get_port(),
            db_schema = %config.db_schema,
            search_url = %config.search_url,
            index_name = %config.index_name,
            page_size = config.page_size,
            checkpoint_keying = ?config.checkpoint_keying,
            connection_mode = ?config.connection_mode,
            "Initializing dependencies"
        );

        let index_config = match &config.index_schema_path {
            Some(path) => IndexConfig::from_schema_file(config.index_name.clone(), path)
                .await
                .map_err(|e| IndexingError::config(format!("Failed to load index schema: {}", e)))?,
            None => IndexConfig::new(config.index_name.clone()),
        };

        let search_provider = Self::connect_to_opensearch(
            &config.search_url,
            index_config,
            config.connection_mode,
            config.connection_retry_interval,
        )
        .await?;

        info!(index_name = %search_provider.index_name(), "Search index ready");

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy_with(config.database.clone());
        let catalog = PostgresCatalogRepository::new(pool, config.db_schema.clone())
            .map_err(|e| IndexingError::config(format!("Invalid catalog schema: {}", e)))?;

        let checkpoint_store = JsonFileCheckpointStore::open(&config.state_path)
            .await
            .map_err(|e| {
                IndexingError::config(format!("Failed to open checkpoint store: {}", e))
            })?;
        info!(state_path = %checkpoint_store.path().display(), "Checkpoint store ready");

        let orchestrator = build_pipeline(
            Arc::new(catalog),
            Arc::new(search_provider),
            Arc::new(checkpoint_store),
            WatermarkKeys::new(config.state_key.clone(), config.checkpoint_keying),
            config.page_size,
            OrchestratorConfig {
                refresh_interval: config.refresh_interval,
                retry_delay: config.retry_delay,
                max_attempts: config.retry_max_attempts,
            },
        );

        Ok(Self { orchestrator })
    }

    /// Provision the index with retry logic based on connection mode.
    async fn connect_to_opensearch(
        url: &str,
        index_config: IndexConfig,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<OpenSearchProvider, IndexingError> {
        loop {
            match Self::try_connect_opensearch(url, index_config.clone()).await {
                Ok(provider) => return Ok(provider),
                Err(e) => match mode {
                    ConnectionMode::FailFast => return Err(e),
                    ConnectionMode::Retry => {
                        warn!(
                            search_url = %url,
                            error = %e,
                            retry_interval_secs = retry_interval.as_secs(),
                            "Failed to provision search index, retrying..."
                        );
                        sleep(retry_interval).await;
                    }
                },
            }
        }
    }

    /// Create the provider and make sure the index exists.
    async fn try_connect_opensearch(
        url: &str,
        index_config: IndexConfig,
    ) -> Result<OpenSearchProvider, IndexingError> {
        let search_provider = OpenSearchProvider::new(url, index_config)
            .await
            .map_err(|e| {
                IndexingError::config(format!("Failed to create OpenSearch provider: {}", e))
            })?;

        search_provider
            .ensure_index_exists()
            .await
            .map_err(|e| IndexingError::config(format!("Failed to ensure index exists: {}", e)))?;

        Ok(search_provider)
    }
}
