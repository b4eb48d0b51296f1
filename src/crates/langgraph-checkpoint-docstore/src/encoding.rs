//! Adapter between the injected serializer and JSON document fields
//!
//! Document stores hold JSON, so serialized bytes are escaped as standard
//! base64 before they reach a record. The stores never see raw bytes and never
//! know which serializer produced them.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use langgraph_checkpoint::{serializer::JsonSerializer, Result, SerializerProtocol};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A typed payload ready to be stored in a document field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedValue {
    pub type_tag: String,
    pub data: String,
}

/// Wraps a [`SerializerProtocol`] and escapes its output for storage
#[derive(Debug, Clone, Default)]
pub struct StorageSerde<S = JsonSerializer> {
    serializer: S,
}

impl<S: SerializerProtocol> StorageSerde<S> {
    pub fn new(serializer: S) -> Self {
        Self { serializer }
    }

    pub fn dumps_typed<T: Serialize>(&self, value: &T) -> Result<EncodedValue> {
        let (type_tag, bytes) = self.serializer.dumps_typed(value)?;
        Ok(EncodedValue {
            type_tag,
            data: STANDARD.encode(bytes),
        })
    }

    pub fn loads_typed<T: DeserializeOwned>(&self, type_tag: &str, data: &str) -> Result<T> {
        let bytes = STANDARD.decode(data)?;
        self.serializer.loads_typed((type_tag, bytes.as_slice()))
    }

    /// Untyped variant used for metadata
    pub fn dumps<T: Serialize>(&self, value: &T) -> Result<String> {
        Ok(STANDARD.encode(self.serializer.dumps(value)?))
    }

    pub fn loads<T: DeserializeOwned>(&self, data: &str) -> Result<T> {
        let bytes = STANDARD.decode(data)?;
        self.serializer.loads(&bytes)
    }
}
