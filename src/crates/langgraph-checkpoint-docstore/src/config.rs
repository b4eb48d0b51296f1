//! Saver configuration
//!
//! Values come from defaults, a YAML/JSON document, or environment variables:
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `CHECKPOINT_KEY_SEPARATOR` | `key_separator` | `$` |
//! | `CHECKPOINT_DEFAULT_NAMESPACE` | `default_namespace` | `default` |
//! | `CHECKPOINT_CHECKPOINTS_COLLECTION` | `checkpoints_collection` | `checkpoints` |
//! | `CHECKPOINT_WRITES_COLLECTION` | `writes_collection` | `writes` |

use crate::key::{KeyCodec, DEFAULT_SEPARATOR};
use langgraph_checkpoint::{CheckpointError, Result};
use serde::Deserialize;
use std::path::Path;

pub const ENV_KEY_SEPARATOR: &str = "CHECKPOINT_KEY_SEPARATOR";
pub const ENV_DEFAULT_NAMESPACE: &str = "CHECKPOINT_DEFAULT_NAMESPACE";
pub const ENV_CHECKPOINTS_COLLECTION: &str = "CHECKPOINT_CHECKPOINTS_COLLECTION";
pub const ENV_WRITES_COLLECTION: &str = "CHECKPOINT_WRITES_COLLECTION";

/// Settings shared by the saver and its backend adapters
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DocStoreConfig {
    /// Separator of composite keys
    pub key_separator: char,

    /// Namespace used when the caller passes none (or an empty one)
    pub default_namespace: String,

    /// Top-level collection holding checkpoints (nested backend)
    pub checkpoints_collection: String,

    /// Top-level collection holding pending writes (nested backend)
    pub writes_collection: String,
}

impl Default for DocStoreConfig {
    fn default() -> Self {
        Self {
            key_separator: DEFAULT_SEPARATOR,
            default_namespace: "default".to_string(),
            checkpoints_collection: "checkpoints".to_string(),
            writes_collection: "writes".to_string(),
        }
    }
}

impl DocStoreConfig {
    /// Defaults overridden by any `CHECKPOINT_*` variables that are set
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(value) = std::env::var(ENV_KEY_SEPARATOR) {
            config.key_separator = parse_separator(&value)?;
        }
        if let Ok(value) = std::env::var(ENV_DEFAULT_NAMESPACE) {
            config.default_namespace = value;
        }
        if let Ok(value) = std::env::var(ENV_CHECKPOINTS_COLLECTION) {
            config.checkpoints_collection = value;
        }
        if let Ok(value) = std::env::var(ENV_WRITES_COLLECTION) {
            config.writes_collection = value;
        }
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML document (JSON is accepted as a YAML subset)
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text)
            .map_err(|e| CheckpointError::Config(format!("Invalid config document: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            CheckpointError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.key_separator.is_alphanumeric() || self.key_separator.is_whitespace() {
            return Err(CheckpointError::Config(format!(
                "key_separator '{}' must be a punctuation character",
                self.key_separator
            )));
        }
        for (field, value) in [
            ("default_namespace", &self.default_namespace),
            ("checkpoints_collection", &self.checkpoints_collection),
            ("writes_collection", &self.writes_collection),
        ] {
            if value.is_empty() {
                return Err(CheckpointError::Config(format!("{} must not be empty", field)));
            }
        }
        if self.default_namespace.contains(self.key_separator) {
            return Err(CheckpointError::Config(format!(
                "default_namespace '{}' contains the key separator",
                self.default_namespace
            )));
        }
        Ok(())
    }

    pub fn codec(&self) -> KeyCodec {
        KeyCodec::new(self.key_separator)
    }

    /// Map an absent or empty namespace onto the default one
    pub fn namespace<'a>(&'a self, checkpoint_ns: Option<&'a str>) -> &'a str {
        match checkpoint_ns {
            Some(ns) if !ns.is_empty() => ns,
            _ => &self.default_namespace,
        }
    }
}

fn parse_separator(value: &str) -> Result<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(CheckpointError::Config(format!(
            "{} must be a single character, got '{}'",
            ENV_KEY_SEPARATOR, value
        ))),
    }
}
