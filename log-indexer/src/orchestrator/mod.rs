//! Orchestrator module for the log indexer ingest.
//!
//! Coordinates the schema registry, record reader, batch publisher and the
//! search provider for one run over a source file.

use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;

use tokio::fs::File;
use tokio::io::{AsyncBufRead, BufReader};
use tokio::sync::broadcast;
use tokio::task::JoinError;
use tracing::{error, info, instrument, warn};

use crate::errors::IngestError;
use crate::publisher::{BatchPublisher, PublisherConfig, RunningTotals};
use crate::queue::BatchQueue;
use crate::reader::RecordReader;
use crate::schema::{SchemaEntry, SchemaRegistry};
use log_indexer_repository::SearchIndexProvider;

/// Default queue capacity, which is also the batch size.
///
/// Around 5MB of NGINX JSON logs per bulk request.
pub const DEFAULT_BATCH_SIZE: NonZeroUsize = match NonZeroUsize::new(21500) {
    Some(size) => size,
    None => panic!("default batch size must be non-zero"),
};

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Target index, resolved against the schema registry.
    pub index: String,
    /// Queue capacity: lines read per chunk and documents per bulk request.
    pub batch_size: NonZeroUsize,
    /// Abort on the first failed bulk request.
    pub fail_fast: bool,
    /// Report recoverable failures in detail.
    pub verbose: bool,
}

impl OrchestratorConfig {
    /// Create a configuration for an index with default settings.
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            fail_fast: false,
            verbose: false,
        }
    }
}

/// Outcome of a completed ingest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// Lines read from the source.
    pub lines_read: usize,
    /// Bulk requests attempted.
    pub batches: u64,
    /// Documents submitted.
    pub attempted: u64,
    /// Documents indexed successfully.
    pub succeeded: u64,
}

/// Orchestrator that coordinates the ingest components.
///
/// The orchestrator:
/// - Resolves the target index before touching the source or the cluster
/// - Creates the index with its declared mapping if it is missing
/// - Runs the publisher in a background task and the reader in the foreground
/// - Waits for the publisher to finish before releasing the search provider
pub struct Orchestrator {
    registry: SchemaRegistry,
    provider: Arc<dyn SearchIndexProvider>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    /// Create a new orchestrator with the given components.
    pub fn new(
        registry: SchemaRegistry,
        provider: Arc<dyn SearchIndexProvider>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            registry,
            provider,
            config,
        }
    }

    /// Ingest a source file.
    ///
    /// # Returns
    ///
    /// * `Ok(IngestSummary)` - Once the source is exhausted and every batch was handled
    /// * `Err(IngestError)` - On an unknown index, a decode error, a source read
    ///   error, or a failed bulk request with fail-fast enabled
    #[instrument(skip(self), fields(index = %self.config.index))]
    pub async fn run(self, source_path: &Path) -> Result<IngestSummary, IngestError> {
        let entry = self.registry.resolve(&self.config.index)?;

        let file = File::open(source_path).await.map_err(|e| {
            IngestError::read(format!("Failed to open {}: {}", source_path.display(), e))
        })?;

        info!(source = %source_path.display(), "Opened source file");

        self.ingest(entry, BufReader::new(file)).await
    }

    /// Ingest from any line-oriented source.
    pub async fn run_with_source<R>(self, source: R) -> Result<IngestSummary, IngestError>
    where
        R: AsyncBufRead + Unpin,
    {
        let entry = self.registry.resolve(&self.config.index)?;
        self.ingest(entry, source).await
    }

    async fn ingest<R>(self, entry: SchemaEntry, source: R) -> Result<IngestSummary, IngestError>
    where
        R: AsyncBufRead + Unpin,
    {
        info!(
            index = %self.config.index,
            batch_size = self.config.batch_size.get(),
            fail_fast = self.config.fail_fast,
            "Starting log indexer orchestrator"
        );

        self.provider
            .ensure_index_exists(&self.config.index, &entry.mapping)
            .await
            .map_err(|e| {
                IngestError::index_setup(format!(
                    "Failed to ensure index {} exists: {}",
                    self.config.index, e
                ))
            })?;

        let queue = Arc::new(BatchQueue::new(self.config.batch_size));
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let publisher = BatchPublisher::new(
            Arc::clone(&self.provider),
            Arc::clone(&queue),
            PublisherConfig {
                index: self.config.index.clone(),
                fail_fast: self.config.fail_fast,
                verbose: self.config.verbose,
            },
        );
        let mut publisher_handle = tokio::spawn(publisher.run(shutdown_rx));

        let reader = RecordReader::new(source, entry.decoder, queue);

        let reader_result = tokio::select! {
            biased;
            result = reader.run() => result,
            joined = &mut publisher_handle => {
                // The publisher only stops early on a fatal error; the reader
                // future is dropped here, cancelling any in-flight read.
                let error = match Self::join_publisher(joined) {
                    Err(e) => e,
                    Ok(_) => IngestError::task("Publisher stopped before the end of the stream"),
                };
                error!(error = %error, "Publisher failed, cancelling reader");
                return Err(error);
            }
        };

        let lines_read = match reader_result {
            Ok(lines_read) => lines_read,
            Err(e) => {
                error!(error = %e, "Reader failed, shutting down publisher");
                let _ = shutdown_tx.send(());
                if let Err(publisher_error) = Self::join_publisher(publisher_handle.await) {
                    warn!(error = %publisher_error, "Publisher failed during shutdown");
                }
                return Err(e);
            }
        };

        let totals = Self::join_publisher(publisher_handle.await)?;

        drop(self.provider);
        info!("Released search client");

        let summary = IngestSummary {
            lines_read,
            batches: totals.batches,
            attempted: totals.attempted,
            succeeded: totals.succeeded,
        };
        info!(
            lines_read = summary.lines_read,
            batches = summary.batches,
            attempted = summary.attempted,
            succeeded = summary.succeeded,
            "Orchestrator finished"
        );
        Ok(summary)
    }

    fn join_publisher(
        joined: Result<Result<RunningTotals, IngestError>, JoinError>,
    ) -> Result<RunningTotals, IngestError> {
        joined.map_err(|e| IngestError::task(format!("Publisher task failed: {}", e)))?
    }
}
