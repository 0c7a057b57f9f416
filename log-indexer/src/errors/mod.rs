//! Error types for the log indexer ingest.

use thiserror::Error;

/// Errors that can occur in the log indexer ingest.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The collection has no registered decoder or no registered mapping.
    #[error("Configuration not found for index {0}")]
    UnknownCollection(String),

    /// A source line could not be decoded into the collection's record shape.
    #[error("Decode error at line {line}: {message}")]
    DecodeError { line: usize, message: String },

    /// The bulk write request as a whole failed.
    #[error("Bulk write error: {0}")]
    BulkWriteError(String),

    /// The target index could not be checked or created.
    #[error("Index setup error: {0}")]
    IndexSetupError(String),

    /// Reading the source failed.
    #[error("Source error: {0}")]
    SourceError(String),

    /// Batch queue misuse.
    #[error("Queue error: {0}")]
    QueueError(#[from] QueueError),

    /// A pipeline task panicked or was cancelled.
    #[error("Task error: {0}")]
    TaskError(String),
}

impl IngestError {
    /// Create an unknown collection error.
    pub fn unknown_collection(name: impl Into<String>) -> Self {
        Self::UnknownCollection(name.into())
    }

    /// Create a decode error for a 1-based source line number.
    pub fn decode(line: usize, message: impl Into<String>) -> Self {
        Self::DecodeError {
            line,
            message: message.into(),
        }
    }

    /// Create a bulk write error.
    pub fn bulk_write(msg: impl Into<String>) -> Self {
        Self::BulkWriteError(msg.into())
    }

    /// Create an index setup error.
    pub fn index_setup(msg: impl Into<String>) -> Self {
        Self::IndexSetupError(msg.into())
    }

    /// Create a source read error.
    pub fn read(msg: impl Into<String>) -> Self {
        Self::SourceError(msg.into())
    }

    /// Create a task error.
    pub fn task(msg: impl Into<String>) -> Self {
        Self::TaskError(msg.into())
    }
}

impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        Self::SourceError(err.to_string())
    }
}

/// Errors returned by the batch queue.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// An item was sent while the queue was at capacity.
    #[error("Queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },
}
