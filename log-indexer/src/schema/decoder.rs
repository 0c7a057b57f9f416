//! Record decoders.

use std::error::Error;
use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Reason a single line could not be decoded.
pub type DecodeFailure = Box<dyn Error + Send + Sync>;

/// One decoded source line, held in its wire encoding.
///
/// Records carry no identity of their own; the search cluster assigns ids.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    document: Value,
}

impl Record {
    /// Wrap an already encoded document.
    pub fn new(document: Value) -> Self {
        Self { document }
    }

    /// The encoded document.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Take the encoded document.
    pub fn into_document(self) -> Value {
        self.document
    }
}

/// Decodes one source line into a [`Record`].
pub trait RecordDecoder: Send + Sync {
    fn decode(&self, line: &str) -> Result<Record, DecodeFailure>;
}

/// Decoder for collections stored as one JSON object per line.
///
/// Lines are deserialized into `T`, which validates the record shape and
/// applies any field conversions, then serialized back to JSON for the wire.
pub struct JsonRecordDecoder<T> {
    _record: PhantomData<fn() -> T>,
}

impl<T> JsonRecordDecoder<T> {
    pub fn new() -> Self {
        Self {
            _record: PhantomData,
        }
    }
}

impl<T> Default for JsonRecordDecoder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonRecordDecoder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonRecordDecoder")
            .field("record", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> RecordDecoder for JsonRecordDecoder<T>
where
    T: DeserializeOwned + Serialize,
{
    fn decode(&self, line: &str) -> Result<Record, DecodeFailure> {
        let record: T = serde_json::from_str(line)?;
        let document = serde_json::to_value(&record)?;
        Ok(Record::new(document))
    }
}
