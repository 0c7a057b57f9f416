//! # Log Indexer Repository
//!
//! This crate provides the trait and implementations for talking to the
//! search cluster. It includes definitions for errors, the provider
//! interface, bulk operation results, and a concrete implementation for
//! OpenSearch.

pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod types;

pub use errors::SearchIndexError;
pub use interfaces::SearchIndexProvider;
pub use opensearch::{ConnectionConfig, OpenSearchProvider};
pub use types::{BatchOperationResult, BatchOperationSummary};
