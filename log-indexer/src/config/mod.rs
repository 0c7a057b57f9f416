//! Configuration and dependency initialization for the log indexer.

mod dependencies;
mod indexer_config;

pub use dependencies::Dependencies;
pub use indexer_config::IndexerConfig;
