//! Search index provider trait definition.
//!
//! This module defines the abstract interface for search index operations,
//! allowing for different backend implementations (OpenSearch, Elasticsearch, etc.).

use async_trait::async_trait;
use log_indexer_shared::MappingDeclaration;
use serde_json::Value;

use crate::errors::SearchIndexError;
use crate::types::BatchOperationSummary;

/// Abstracts the underlying search index implementation (OpenSearch, Elasticsearch, etc.).
///
/// Implementations are shared between the orchestrator (index setup) and the
/// batch publisher (bulk writes), so they must be `Send + Sync`. Tests inject
/// mock implementations through this trait.
///
/// # Index Initialization
///
/// `ensure_index_exists` is called once during startup, before any document
/// is written.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Ensure the index exists, creating it with `mapping` if it does not.
    ///
    /// Calling this for an index that already exists is not an error and
    /// does not modify the existing index.
    ///
    /// # Arguments
    ///
    /// * `index` - The index name
    /// * `mapping` - The field mapping to create the index with
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the index is ready for use
    /// * `Err(SearchIndexError)` - If the index could not be checked or created
    async fn ensure_index_exists(
        &self,
        index: &str,
        mapping: &MappingDeclaration,
    ) -> Result<(), SearchIndexError>;

    /// Index a batch of documents with a single bulk request.
    ///
    /// Documents are submitted in slice order. The cluster assigns document ids.
    ///
    /// # Arguments
    ///
    /// * `index` - The target index name
    /// * `documents` - Encoded documents (`_source` bodies)
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - Aggregate counts and per-document results;
    ///   individual document failures are reported here, not as an error
    /// * `Err(SearchIndexError)` - If the bulk request fails entirely
    async fn bulk_index_documents(
        &self,
        index: &str,
        documents: &[Value],
    ) -> Result<BatchOperationSummary, SearchIndexError>;
}
