//! # Log Indexer
//!
//! Streams line-delimited log records from a file into OpenSearch using
//! bounded-memory batching.
//!
//! ## Architecture
//!
//! The indexer is a single-producer, single-consumer pipeline:
//!
//! 1. **Reader**: Reads the source in chunks and decodes each line
//! 2. **Queue**: Bounded hand-off whose capacity is the batch size
//! 3. **Publisher**: Drains full batches and bulk-writes them
//! 4. **Orchestrator**: Resolves the schema, prepares the index and runs both sides
//!
//! The reader never gets more than one batch ahead of the publisher: after
//! filling the queue it waits until every item has been marked processed.
//!
//! ## Modules
//!
//! - [`config`]: Run configuration and dependency initialization
//! - [`schema`]: Schema registry mapping index names to decoders and mappings
//! - [`queue`]: The bounded batch queue
//! - [`reader`]: Reads and decodes source lines
//! - [`publisher`]: Bulk-writes batches to the search index
//! - [`orchestrator`]: Coordinates the ingest flow
//! - [`errors`]: Error types for the indexer

pub mod config;
pub mod errors;
pub mod orchestrator;
pub mod publisher;
pub mod queue;
pub mod reader;
pub mod schema;

pub use config::{Dependencies, IndexerConfig};
pub use errors::IngestError;
pub use orchestrator::{IngestSummary, Orchestrator, OrchestratorConfig};

use thiserror::Error;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Ingest error.
    #[error("Ingest error: {0}")]
    IngestError(#[from] IngestError),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
