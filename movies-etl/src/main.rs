//! Movies ETL Main Entry Point
//!
//! Syncs changed rows of the movie catalog into the search index until the
//! process is stopped or the retry budget is exhausted.

use dotenv::dotenv;
use movies_etl::config::LogFormat;
use movies_etl::{Dependencies, EtlConfig, IndexingError};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("movies_etl=info,movies_etl_repository=info"));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_thread_ids(true),
                )
                .init();

            info!(
                service_name = "movies-etl",
                service_version = env!("CARGO_PKG_VERSION"),
                "Tracing initialized with JSON format"
            );
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
                .init();

            info!(
                service_name = "movies-etl",
                service_version = env!("CARGO_PKG_VERSION"),
                "Tracing initialized with console output"
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), IndexingError> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = EtlConfig::from_env()?;
    init_tracing(config.log_format);

    info!("Starting movies ETL");

    let deps = match Dependencies::new(&config).await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    tokio::select! {
        result = deps.orchestrator.run() => match result {
            Ok(()) => {
                info!("Movies ETL completed successfully");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Movies ETL failed");
                Err(e.into())
            }
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            Ok(())
        }
    }
}
