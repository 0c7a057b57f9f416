//! OpenSearch provider implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the OpenSearch Rust crate.

use async_trait::async_trait;
use log_indexer_shared::MappingDeclaration;
use opensearch::{
    auth::Credentials,
    http::request::JsonBody,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts},
    BulkParts, OpenSearch,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchIndexProvider;
use crate::opensearch::connection::ConnectionConfig;
use crate::types::{BatchOperationResult, BatchOperationSummary};

/// Error type reported by the cluster when creating an index that already exists.
const ALREADY_EXISTS_ERROR: &str = "resource_already_exists_exception";

/// OpenSearch provider implementation.
///
/// Writes documents through the `_bulk` API and creates indices on demand.
///
/// # Example
///
/// ```ignore
/// use log_indexer_repository::{ConnectionConfig, OpenSearchProvider, SearchIndexProvider};
/// use log_indexer_shared::NginxLog;
///
/// let config = ConnectionConfig::new("http://localhost:9200").with_basic_auth("admin", "admin");
/// let provider = OpenSearchProvider::new(&config).await?;
///
/// provider.ensure_index_exists("nginx", &NginxLog::mapping()).await?;
/// let summary = provider.bulk_index_documents("nginx", &documents).await?;
/// ```
pub struct OpenSearchProvider {
    client: OpenSearch,
}

impl OpenSearchProvider {
    /// Create a new OpenSearch provider for the configured cluster.
    ///
    /// No request is sent here; connection problems surface on the first call.
    ///
    /// # Arguments
    ///
    /// * `config` - The cluster URL and optional basic auth credentials
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchProvider)` - A new provider instance
    /// * `Err(SearchIndexError)` - If the URL is invalid or the transport cannot be built
    pub async fn new(config: &ConnectionConfig) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(&config.url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let mut builder = TransportBuilder::new(conn_pool).disable_proxy();
        if let Some((username, password)) = config.basic_auth() {
            builder = builder.auth(Credentials::Basic(
                username.to_string(),
                password.to_string(),
            ));
        }
        let transport = builder
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %config.url,
            authenticated = config.basic_auth().is_some(),
            "Created OpenSearch provider"
        );

        Ok(Self { client })
    }

    /// Turn a `_bulk` response body into a per-document summary.
    ///
    /// An item succeeds when its status is 2xx. Items are reported in
    /// response order, which the cluster guarantees matches request order.
    fn summarize_bulk_response(
        body: &Value,
        submitted: usize,
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let items = body
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| SearchIndexError::parse("Bulk response is missing 'items'"))?;

        if items.len() != submitted {
            warn!(
                submitted = submitted,
                returned = items.len(),
                "Bulk response item count does not match request"
            );
        }

        let results = items
            .iter()
            .enumerate()
            .map(|(position, item)| {
                // Each item is keyed by its action name
                let outcome = item.get("index").or_else(|| item.get("create"));
                let status = outcome
                    .and_then(|o| o.get("status"))
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                let success = (200..300).contains(&status);
                let error = if success {
                    None
                } else {
                    Some(
                        outcome
                            .and_then(|o| o.get("error"))
                            .map(Self::describe_error)
                            .unwrap_or_else(|| format!("status {}", status)),
                    )
                };

                BatchOperationResult {
                    position,
                    success,
                    error,
                }
            })
            .collect();

        Ok(BatchOperationSummary::from_results(results))
    }

    /// Render a cluster error object as `type: reason`.
    fn describe_error(error: &Value) -> String {
        let kind = error.get("type").and_then(Value::as_str);
        let reason = error.get("reason").and_then(Value::as_str);
        match (kind, reason) {
            (Some(kind), Some(reason)) => format!("{}: {}", kind, reason),
            (Some(kind), None) => kind.to_string(),
            (None, Some(reason)) => reason.to_string(),
            (None, None) => error.to_string(),
        }
    }

    /// Whether an index creation error body means the index is already there.
    fn is_already_exists(error_body: &Value) -> bool {
        error_body
            .pointer("/error/type")
            .and_then(Value::as_str)
            .is_some_and(|kind| kind == ALREADY_EXISTS_ERROR)
    }
}

#[async_trait]
impl SearchIndexProvider for OpenSearchProvider {
    /// Ensure the index exists, creating it with the given mapping if it does not.
    ///
    /// A concurrent creation by another client is reported by the cluster as
    /// `resource_already_exists_exception` and treated as success.
    async fn ensure_index_exists(
        &self,
        index: &str,
        mapping: &MappingDeclaration,
    ) -> Result<(), SearchIndexError> {
        if index.is_empty() {
            return Err(SearchIndexError::validation("Index name cannot be empty"));
        }

        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if status.is_success() {
            debug!(index = %index, "Index already exists");
            return Ok(());
        }
        if status.as_u16() != 404 {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Index existence check failed");
            return Err(SearchIndexError::index_creation(format!(
                "Index existence check failed with status {}: {}",
                status, error_body
            )));
        }

        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(mapping.to_index_body())
            .send()
            .await
            .map_err(|e| SearchIndexError::index_creation(e.to_string()))?;

        let status = response.status_code();
        if status.is_success() {
            info!(index = %index, fields = mapping.len(), "Created index");
            return Ok(());
        }

        let error_body = response.json::<Value>().await.unwrap_or_default();
        if Self::is_already_exists(&error_body) {
            info!(index = %index, "Index was created concurrently");
            return Ok(());
        }

        error!(status = %status, body = %error_body, "Index creation failed");
        Err(SearchIndexError::index_creation(format!(
            "Index creation failed with status {}: {}",
            status, error_body
        )))
    }

    /// Index a batch of documents with a single `_bulk` request.
    ///
    /// Returns `Err` only when the request itself fails (transport error or a
    /// non-2xx response). Rejected documents are counted in the summary.
    async fn bulk_index_documents(
        &self,
        index: &str,
        documents: &[Value],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if documents.is_empty() {
            return Ok(BatchOperationSummary::empty());
        }

        let action = json!({ "index": { "_index": index } });
        let mut body: Vec<JsonBody<&Value>> = Vec::with_capacity(documents.len() * 2);
        for document in documents {
            body.push(JsonBody::new(&action));
            body.push(JsonBody::new(document));
        }

        let response = self
            .client
            .bulk(BulkParts::Index(index))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchIndexError::bulk_index(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Bulk request failed");
            return Err(SearchIndexError::bulk_index(format!(
                "Bulk request failed with status {}: {}",
                status, error_body
            )));
        }

        let response_body = response
            .json::<Value>()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        let summary = Self::summarize_bulk_response(&response_body, documents.len())?;

        debug!(
            index = %index,
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Bulk request completed"
        );
        Ok(summary)
    }
}
