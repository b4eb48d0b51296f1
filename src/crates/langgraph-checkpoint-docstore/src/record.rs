//! Persisted record layout and the per-backend store contracts
//!
//! Records are the logical documents a backend stores; their field names are
//! the on-disk schema shared by every backend:
//!
//! ```text
//! checkpoint: { checkpoint_key, type, checkpoint, metadata, parent_checkpoint_id }
//! write:      { checkpoint_key, channel, type, value }
//! ```
//!
//! A write record's `checkpoint_key` holds its full *write* key, which carries
//! the `(task_id, idx)` slot.

use crate::key::{CheckpointKey, WriteKey};
use async_trait::async_trait;
use langgraph_checkpoint::Result;
use serde::{Deserialize, Serialize};

/// One stored checkpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub checkpoint_key: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    pub checkpoint: String,
    pub metadata: String,
    /// Empty for a root checkpoint
    #[serde(default)]
    pub parent_checkpoint_id: String,
}

/// One stored pending write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteRecord {
    pub checkpoint_key: String,
    pub channel: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    pub value: String,
}

/// Backend persistence of checkpoint records
///
/// Implementations map [`CheckpointKey`] onto their native addressing. Ordering
/// of scan results is unspecified; callers sort.
#[async_trait]
pub trait CheckpointRecordStore: Send + Sync {
    /// Insert or overwrite the record stored under `key`
    async fn upsert_checkpoint(&self, key: &CheckpointKey, record: CheckpointRecord) -> Result<()>;

    /// Point read; `Ok(None)` when nothing is stored under `key`
    async fn get_checkpoint(&self, key: &CheckpointKey) -> Result<Option<CheckpointRecord>>;

    /// Every checkpoint of `thread_id`, optionally narrowed to one namespace
    async fn scan_checkpoints(
        &self,
        thread_id: &str,
        checkpoint_ns: Option<&str>,
    ) -> Result<Vec<CheckpointRecord>>;
}

/// Backend persistence of pending-write records
#[async_trait]
pub trait WriteRecordStore: Send + Sync {
    /// Insert or overwrite the write stored in slot `key`
    async fn upsert_write(&self, key: &WriteKey, record: WriteRecord) -> Result<()>;

    /// Every write recorded against `checkpoint`, in no particular order
    async fn scan_writes(&self, checkpoint: &CheckpointKey) -> Result<Vec<WriteRecord>>;
}
