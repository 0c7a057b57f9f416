//! NGINX access log record.
//!
//! This module defines the record shape of the `nginx` collection, one JSON
//! object per source line.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::types::mapping::{FieldType, MappingDeclaration};

/// Timestamp format used by NGINX access logs (e.g. `17/May/2015:08:05:32 +0000`).
pub const SOURCE_TIME_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Timestamp format sent to the search cluster (e.g. `2015-05-17T08:05:32+0000`).
pub const WIRE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// A single NGINX access log entry.
///
/// Decoded from the source line as-is, except for `time`, which is parsed from
/// [`SOURCE_TIME_FORMAT`] and serialized back using [`WIRE_TIME_FORMAT`].
/// Unknown fields in the source object are ignored.
///
/// # Example
///
/// ```
/// use log_indexer_shared::NginxLog;
///
/// let line = r#"{"time": "17/May/2015:08:05:32 +0000", "remote_ip": "93.180.71.3", "remote_user": "-", "request": "GET /downloads/product_1 HTTP/1.1", "response": 304, "bytes": 0, "referrer": "-", "agent": "Debian APT-HTTP/1.3"}"#;
/// let log: NginxLog = serde_json::from_str(line).unwrap();
/// assert_eq!(log.response, 304);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NginxLog {
    #[serde(with = "access_log_time")]
    pub time: DateTime<FixedOffset>,
    pub remote_ip: String,
    pub remote_user: String,
    pub request: String,
    pub response: i64,
    pub bytes: i64,
    pub referrer: String,
    pub agent: String,
}

impl NginxLog {
    /// Field mapping declared for the `nginx` index.
    pub fn mapping() -> MappingDeclaration {
        MappingDeclaration::new()
            .field("time", FieldType::Date)
            .field("remote_ip", FieldType::Text)
            .field("remote_user", FieldType::Text)
            .field("request", FieldType::Text)
            .field("response", FieldType::Long)
            .field("bytes", FieldType::Long)
            .field("referrer", FieldType::Text)
            .field("agent", FieldType::Text)
    }
}

/// Serde adapter for access log timestamps.
///
/// Reads the source format, writes the wire format.
mod access_log_time {
    use chrono::{DateTime, FixedOffset};
    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::{SOURCE_TIME_FORMAT, WIRE_TIME_FORMAT};

    pub fn serialize<S>(time: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&time.format(WIRE_TIME_FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_str(&raw, SOURCE_TIME_FORMAT)
            .map_err(|e| de::Error::custom(format!("invalid timestamp '{}': {}", raw, e)))
    }
}
