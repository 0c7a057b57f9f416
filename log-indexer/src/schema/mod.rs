//! Schema registry for the log indexer.
//!
//! Maps a collection (index) name to the decoder used for its source lines
//! and the field mapping the index is created with.

mod decoder;

pub use decoder::{DecodeFailure, JsonRecordDecoder, Record, RecordDecoder};

use std::collections::HashMap;
use std::sync::Arc;

use log_indexer_shared::{MappingDeclaration, NginxLog};

use crate::errors::IngestError;

/// Name of the built-in NGINX access log collection.
pub const NGINX_COLLECTION: &str = "nginx";

/// Decoder and mapping registered for one collection.
#[derive(Clone)]
pub struct SchemaEntry {
    /// Turns one source line into a [`Record`].
    pub decoder: Arc<dyn RecordDecoder>,
    /// Field mapping declared when the index is created.
    pub mapping: MappingDeclaration,
}

/// Registry of known collections.
///
/// Built once at startup and passed to the orchestrator. A collection is only
/// resolvable when both a decoder and a mapping are registered for it.
#[derive(Default)]
pub struct SchemaRegistry {
    decoders: HashMap<String, Arc<dyn RecordDecoder>>,
    mappings: HashMap<String, MappingDeclaration>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in collections registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register_decoder(NGINX_COLLECTION, Arc::new(JsonRecordDecoder::<NginxLog>::new()))
            .register_mapping(NGINX_COLLECTION, NginxLog::mapping());
        registry
    }

    /// Register the decoder for a collection, replacing any previous one.
    pub fn register_decoder(
        &mut self,
        collection: impl Into<String>,
        decoder: Arc<dyn RecordDecoder>,
    ) -> &mut Self {
        self.decoders.insert(collection.into(), decoder);
        self
    }

    /// Register the mapping for a collection, replacing any previous one.
    pub fn register_mapping(
        &mut self,
        collection: impl Into<String>,
        mapping: MappingDeclaration,
    ) -> &mut Self {
        self.mappings.insert(collection.into(), mapping);
        self
    }

    /// Look up the schema entry for a collection.
    ///
    /// # Returns
    ///
    /// * `Ok(SchemaEntry)` - If both a decoder and a mapping are registered
    /// * `Err(IngestError::UnknownCollection)` - Otherwise
    pub fn resolve(&self, collection: &str) -> Result<SchemaEntry, IngestError> {
        match (self.decoders.get(collection), self.mappings.get(collection)) {
            (Some(decoder), Some(mapping)) => Ok(SchemaEntry {
                decoder: Arc::clone(decoder),
                mapping: mapping.clone(),
            }),
            _ => Err(IngestError::unknown_collection(collection)),
        }
    }

    /// Names of all resolvable collections, sorted.
    pub fn collections(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .decoders
            .keys()
            .filter(|name| self.mappings.contains_key(*name))
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names
    }
}
