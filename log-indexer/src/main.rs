//! Log Indexer Main Entry Point
//!
//! Reads a line-delimited JSON log file and indexes it into OpenSearch.

use clap::Parser;
use dotenv::dotenv;
use log_indexer::{Dependencies, IndexerConfig, IndexingError};
use std::env;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing(verbose: bool) -> Result<(), IndexingError> {
    let default_directives = if verbose {
        "log_indexer=debug,log_indexer_repository=debug"
    } else {
        "log_indexer=info,log_indexer_repository=info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));

    let json_output = env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_output {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init()
            .map_err(|e| IndexingError::config(format!("Failed to initialize tracing: {}", e)))?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .try_init()
            .map_err(|e| IndexingError::config(format!("Failed to initialize tracing: {}", e)))?;
    }

    info!(
        service_name = "log-indexer",
        service_version = env!("CARGO_PKG_VERSION"),
        json = json_output,
        "Tracing initialized"
    );

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), IndexingError> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = IndexerConfig::parse();

    init_tracing(config.verbose)?;

    info!("Starting log indexer");

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

    match deps.orchestrator.run(&config.file).await {
        Ok(summary) => {
            info!(
                batches = summary.batches,
                attempted = summary.attempted,
                succeeded = summary.succeeded,
                "Log indexer completed successfully"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Log indexer failed");
            Err(e.into())
        }
    }
}
