//! Index mapping declarations.
//!
//! A mapping declaration names each document field and the type the search
//! cluster should index it as. It is sent once, when the index is created.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Field types understood by the search cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Date,
    Text,
    Long,
}

/// Field name to [`FieldType`] declaration for one index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingDeclaration {
    properties: BTreeMap<String, FieldType>,
}

impl MappingDeclaration {
    /// Create an empty declaration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field, replacing any previous declaration with the same name.
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.properties.insert(name.into(), field_type);
        self
    }

    /// Look up the declared type of a field.
    pub fn get(&self, name: &str) -> Option<FieldType> {
        self.properties.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Render the `mappings` object of an index creation request.
    ///
    /// # Example
    ///
    /// ```
    /// use log_indexer_shared::{FieldType, MappingDeclaration};
    ///
    /// let mapping = MappingDeclaration::new().field("bytes", FieldType::Long);
    /// assert_eq!(
    ///     mapping.to_mappings(),
    ///     serde_json::json!({"properties": {"bytes": {"type": "long"}}})
    /// );
    /// ```
    pub fn to_mappings(&self) -> Value {
        let properties: serde_json::Map<String, Value> = self
            .properties
            .iter()
            .map(|(name, ty)| (name.clone(), json!({ "type": ty })))
            .collect();

        json!({ "properties": properties })
    }

    /// Render the full body of an index creation request.
    pub fn to_index_body(&self) -> Value {
        json!({ "mappings": self.to_mappings() })
    }
}
