//! Extensible checkpoint storage trait for custom backend implementations
//!
//! This module defines the **[`CheckpointSaver`]** trait, the contract the graph
//! engine uses to persist and reload execution state. The shape of the trait is
//! the same for every backend, so an engine can swap an in-process store for a
//! remote document store without changing its call sites.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  Graph engine                                │
//! │   • put()         after every superstep      │
//! │   • put_writes()  as tasks finish            │
//! │   • get_tuple()   to resume                  │
//! │   • list()        for history / time-travel  │
//! └─────────────────────┬────────────────────────┘
//!                       │ CheckpointSaver
//!                       ▼
//! ┌──────────────────────────────────────────────┐
//! │  Backend (document store, database, ...)     │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Implementation Requirements
//!
//! 1. **Thread isolation** - nothing stored under one `thread_id` may ever be
//!    returned for another
//! 2. **Latest resolution** - `get_tuple` without a `checkpoint_id` returns the
//!    checkpoint with the greatest id in the requested namespace
//! 3. **Ordering** - `list` yields newest first; pending writes come back in
//!    replay order
//! 4. **Absence is not an error** - missing checkpoints are `Ok(None)`
//! 5. **Thread safety** - implementations are `Send + Sync` and tolerate
//!    concurrent calls touching different checkpoints
//!
//! # Usage
//!
//! ```rust,ignore
//! use futures::StreamExt;
//!
//! // Resume from the latest checkpoint of a thread
//! let config = CheckpointConfig::new().with_thread_id("conversation-123".into());
//! if let Some(tuple) = saver.get_tuple(&config).await? {
//!     for (task_id, channel, value) in tuple.pending_writes.unwrap_or_default() {
//!         // replay writes in order
//!     }
//! }
//!
//! // Page through history, ten at a time
//! let mut page = saver.list(Some(&config), None, None, Some(10)).await?;
//! while let Some(tuple) = page.next().await {
//!     println!("{:?}", tuple?.config.checkpoint_id);
//! }
//! ```

use crate::{
    checkpoint::{
        ChannelVersions, Checkpoint, CheckpointConfig, CheckpointMetadata, CheckpointTuple,
    },
    error::Result,
};
use async_trait::async_trait;
use futures::stream::Stream;
use std::collections::HashMap;
use std::pin::Pin;

/// Type alias for async stream of checkpoint tuples
///
/// The stream is single-pass: once exhausted it yields nothing further.
pub type CheckpointStream =
    Pin<Box<dyn Stream<Item = Result<CheckpointTuple>> + Send + 'static>>;

/// Core trait for implementing checkpoint storage backends
#[async_trait]
pub trait CheckpointSaver: Send + Sync {
    /// Fetch only the checkpoint payload addressed by `config`
    async fn get(&self, config: &CheckpointConfig) -> Result<Option<Checkpoint>> {
        Ok(self.get_tuple(config).await?.map(|tuple| tuple.checkpoint))
    }

    /// Retrieve a complete checkpoint tuple.
    ///
    /// * With `checkpoint_id` set: that exact checkpoint
    /// * Without: the most recent checkpoint of `(thread_id, checkpoint_ns)`
    ///
    /// The returned tuple carries the stored config, the checkpoint, its
    /// metadata, the parent config (if the checkpoint has a parent) and the
    /// pending writes recorded against it.
    ///
    /// # Errors
    ///
    /// `Invalid` when `thread_id` is missing; any store or decoding failure
    /// for the addressed checkpoint.
    async fn get_tuple(&self, config: &CheckpointConfig) -> Result<Option<CheckpointTuple>>;

    /// Stream checkpoints of a thread, newest first.
    ///
    /// # Arguments
    ///
    /// * `config` - must carry `thread_id`; `checkpoint_ns` narrows the listing
    ///   to one namespace, `None` lists every namespace of the thread
    /// * `filter` - metadata fields that must match exactly
    /// * `before` - only checkpoints whose id is strictly less than
    ///   `before.checkpoint_id`
    /// * `limit` - maximum number of tuples yielded
    ///
    /// A corrupt record is skipped rather than ending the stream.
    async fn list(
        &self,
        config: Option<&CheckpointConfig>,
        filter: Option<HashMap<String, serde_json::Value>>,
        before: Option<&CheckpointConfig>,
        limit: Option<usize>,
    ) -> Result<CheckpointStream>;

    /// Store a checkpoint.
    ///
    /// `config.checkpoint_id`, when present, names the parent of `checkpoint`.
    /// Storing the same checkpoint id twice overwrites the earlier record.
    ///
    /// # Returns
    ///
    /// A config addressing the stored checkpoint.
    async fn put(
        &self,
        config: &CheckpointConfig,
        checkpoint: Checkpoint,
        metadata: CheckpointMetadata,
        new_versions: ChannelVersions,
    ) -> Result<CheckpointConfig>;

    /// Store the writes one task produced against the checkpoint in `config`.
    ///
    /// Writes are `(channel, value)` pairs in production order; a write landing
    /// on an existing `(task_id, idx)` slot replaces it.
    async fn put_writes(
        &self,
        config: &CheckpointConfig,
        writes: Vec<(String, serde_json::Value)>,
        task_id: String,
    ) -> Result<()>;
}
