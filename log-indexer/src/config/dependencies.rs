//! Dependency initialization and wiring for the log indexer.

use std::sync::Arc;
use tracing::info;

use crate::config::IndexerConfig;
use crate::orchestrator::Orchestrator;
use crate::schema::SchemaRegistry;
use crate::IndexingError;
use log_indexer_repository::OpenSearchProvider;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
}

impl Dependencies {
    /// Initialize all dependencies from the run configuration.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If the search provider cannot be created
    pub async fn new(config: &IndexerConfig) -> Result<Self, IndexingError> {
        info!(
            opensearch_url = %config.cluster,
            index = %config.index,
            source = %config.file.display(),
            batch_size = config.batch_size.get(),
            exit_on_error = config.exit_on_error,
            "Initializing dependencies"
        );

        let search_provider = OpenSearchProvider::new(&config.connection_config())
            .await
            .map_err(|e| {
                IndexingError::config(format!("Failed to create OpenSearch provider: {}", e))
            })?;

        let registry = SchemaRegistry::with_defaults();
        info!(collections = ?registry.collections(), "Schema registry loaded");

        let orchestrator = Orchestrator::new(
            registry,
            Arc::new(search_provider),
            config.orchestrator_config(),
        );

        Ok(Self { orchestrator })
    }
}
