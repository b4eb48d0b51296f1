//! Serialization protocol for checkpoints

use crate::error::{CheckpointError, Result};
use serde::{de::DeserializeOwned, Serialize};

/// Protocol for serializing and deserializing checkpoint data
///
/// Implementations provide a byte format plus a type tag naming it. The typed
/// variants pair every payload with that tag so a reader can tell which format
/// produced the bytes it is looking at.
pub trait SerializerProtocol: Send + Sync {
    /// Tag stored next to every typed payload
    fn type_tag(&self) -> &str;

    /// Serialize a value to bytes
    fn dumps<T: Serialize>(&self, value: &T) -> Result<Vec<u8>>;

    /// Deserialize a value from bytes
    fn loads<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T>;

    /// Serialize a value to a `(type_tag, bytes)` pair
    fn dumps_typed<T: Serialize>(&self, value: &T) -> Result<(String, Vec<u8>)> {
        Ok((self.type_tag().to_string(), self.dumps(value)?))
    }

    /// Deserialize a `(type_tag, bytes)` pair, rejecting foreign tags
    fn loads_typed<T: DeserializeOwned>(&self, (type_tag, data): (&str, &[u8])) -> Result<T> {
        if type_tag != self.type_tag() {
            return Err(CheckpointError::TypeMismatch {
                expected: self.type_tag().to_string(),
                found: type_tag.to_string(),
            });
        }
        self.loads(data)
    }
}

/// JSON-based serializer (default)
#[derive(Debug, Clone, Default)]
pub struct JsonSerializer;

impl JsonSerializer {
    pub const TYPE_TAG: &'static str = "json";

    pub fn new() -> Self {
        Self
    }
}

impl SerializerProtocol for JsonSerializer {
    fn type_tag(&self) -> &str {
        Self::TYPE_TAG
    }

    fn dumps<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn loads<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(data)?)
    }
}
