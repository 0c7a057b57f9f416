//! # Log Indexer Shared
//!
//! This crate defines shared data structures used across the log indexer.
//! It includes the record types decoded from source files and the field
//! mapping declarations handed to the search cluster when an index is created.

pub mod types;

pub use types::mapping::{FieldType, MappingDeclaration};
pub use types::nginx_log::NginxLog;
