//! This module defines the core data structures used across the log indexer.
//! It re-exports the record and mapping types.

pub mod mapping;
pub mod nginx_log;

pub use mapping::{FieldType, MappingDeclaration};
pub use nginx_log::NginxLog;
