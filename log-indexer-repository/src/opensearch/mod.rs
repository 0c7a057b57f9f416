//! OpenSearch implementation of the search index provider.
//!
//! This module provides a concrete implementation of `SearchIndexProvider`
//! using OpenSearch as the backend.

mod connection;
mod provider;

pub use connection::ConnectionConfig;
pub use provider::OpenSearchProvider;
