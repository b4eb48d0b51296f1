//! Error types for checkpoint operations

use thiserror::Error;

/// Result type for checkpoint operations
pub type Result<T> = std::result::Result<T, CheckpointError>;

/// Errors that can occur during checkpoint operations
///
/// "Not found" is never an error: read operations return `Ok(None)` instead.
#[derive(Error, Debug)]
pub enum CheckpointError {
    /// The caller supplied an unusable config or key segment
    #[error("Invalid checkpoint request: {0}")]
    Invalid(String),

    /// A stored or constructed key does not follow the key grammar
    #[error("Malformed key '{key}': {reason}")]
    MalformedKey { key: String, reason: String },

    /// The backing store could not be reached or refused the request
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored bytes could not be unescaped
    #[error("Encoding error: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// A typed payload was written by a different serializer
    #[error("Type mismatch: expected '{expected}', found '{found}'")]
    TypeMismatch { expected: String, found: String },

    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CheckpointError {
    /// Build a [`CheckpointError::MalformedKey`]
    pub fn malformed_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error describes a single corrupt record rather than a
    /// failure of the store itself.
    ///
    /// Enumerations skip records failing this way and keep going.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::MalformedKey { .. }
                | Self::Serialization(_)
                | Self::Encoding(_)
                | Self::TypeMismatch { .. }
        )
    }
}
