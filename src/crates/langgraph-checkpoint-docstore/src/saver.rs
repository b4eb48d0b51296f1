//! [`CheckpointSaver`] over any pair of record stores
//!
//! The saver owns everything that must behave identically across backends:
//! key encoding, namespace normalization, payload serialization, latest
//! resolution, listing order and pending-write ordering. Backends only move
//! records in and out.

use crate::assembler::{assemble_tuple, load_pending_writes};
use crate::backends::{CollectionClient, CollectionStore, PartitionedClient, PartitionedStore};
use crate::config::DocStoreConfig;
use crate::encoding::StorageSerde;
use crate::key::{CheckpointKey, KeyCodec, WriteKey};
use crate::record::{CheckpointRecord, CheckpointRecordStore, WriteRecord, WriteRecordStore};
use crate::resolver::{decode_fetched, decode_scanned, order_for_listing, resolve};
use async_trait::async_trait;
use futures::future;
use futures::stream::{self, StreamExt};
use langgraph_checkpoint::{
    ChannelVersions, Checkpoint, CheckpointConfig, CheckpointError, CheckpointMetadata,
    CheckpointSaver, CheckpointStream, CheckpointTuple, JsonSerializer, PendingWrite, Result,
    SerializerProtocol,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Channel carrying a task's error
pub const ERROR: &str = "__error__";
/// Channel carrying scheduled follow-up tasks
pub const SCHEDULED: &str = "__scheduled__";
/// Channel carrying interrupts raised by a task
pub const INTERRUPT: &str = "__interrupt__";
/// Channel carrying values a task is resumed with
pub const RESUME: &str = "__resume__";

/// Fixed write index of a reserved channel
pub fn reserved_write_idx(channel: &str) -> Option<i64> {
    match channel {
        ERROR => Some(-1),
        SCHEDULED => Some(-2),
        INTERRUPT => Some(-3),
        RESUME => Some(-4),
        _ => None,
    }
}

/// Write index of the `position`-th write produced by a task
pub fn write_idx(channel: &str, position: usize) -> i64 {
    reserved_write_idx(channel).unwrap_or(position as i64)
}

struct Inner<B, S> {
    backend: B,
    serde: StorageSerde<S>,
    codec: KeyCodec,
    config: DocStoreConfig,
}

/// Checkpoint saver for document stores
///
/// Cloning is cheap; clones share the backend and its client.
///
/// # Example
///
/// ```rust,no_run
/// use langgraph_checkpoint::{Checkpoint, CheckpointConfig, CheckpointMetadata, CheckpointSaver};
/// use langgraph_checkpoint_docstore::{DocStoreConfig, DocumentCheckpointSaver, InMemoryPartitionedClient};
/// use std::{collections::HashMap, sync::Arc};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = Arc::new(InMemoryPartitionedClient::new());
///     let saver = DocumentCheckpointSaver::partitioned(client, DocStoreConfig::default())?;
///
///     let config = CheckpointConfig::new().with_thread_id("thread-1".to_string());
///     let saved = saver
///         .put(&config, Checkpoint::empty(), CheckpointMetadata::new(), HashMap::new())
///         .await?;
///
///     let latest = saver.get_tuple(&config).await?.expect("just saved");
///     assert_eq!(latest.config, saved);
///     Ok(())
/// }
/// ```
pub struct DocumentCheckpointSaver<B, S = JsonSerializer> {
    inner: Arc<Inner<B, S>>,
}

impl<B, S> Clone for DocumentCheckpointSaver<B, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> DocumentCheckpointSaver<PartitionedStore<C>>
where
    C: PartitionedClient + ?Sized + 'static,
{
    /// Saver over a flat, partitioned document store
    pub fn partitioned(client: Arc<C>, config: DocStoreConfig) -> Result<Self> {
        let store = PartitionedStore::new(client, config.codec());
        Self::new(store, config)
    }
}

impl<C> DocumentCheckpointSaver<CollectionStore<C>>
where
    C: CollectionClient + ?Sized + 'static,
{
    /// Saver over a hierarchical document store
    pub fn collections(client: Arc<C>, config: DocStoreConfig) -> Result<Self> {
        let store = CollectionStore::new(client, &config);
        Self::new(store, config)
    }
}

impl<B> DocumentCheckpointSaver<B>
where
    B: CheckpointRecordStore + WriteRecordStore + 'static,
{
    pub fn new(backend: B, config: DocStoreConfig) -> Result<Self> {
        Self::with_serializer(backend, JsonSerializer::new(), config)
    }
}

impl<B, S> DocumentCheckpointSaver<B, S>
where
    B: CheckpointRecordStore + WriteRecordStore + 'static,
    S: SerializerProtocol + 'static,
{
    pub fn with_serializer(backend: B, serializer: S, config: DocStoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(Inner {
                backend,
                serde: StorageSerde::new(serializer),
                codec: config.codec(),
                config,
            }),
        })
    }

    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    pub fn config(&self) -> &DocStoreConfig {
        &self.inner.config
    }
}

impl<B, S> Inner<B, S>
where
    B: CheckpointRecordStore + WriteRecordStore,
    S: SerializerProtocol,
{
    /// Check a caller-supplied key segment before it is written
    fn segment<'a>(&self, field: &str, value: Option<&'a str>) -> Result<&'a str> {
        match value {
            Some(value) if !value.is_empty() => {
                self.codec.check_segment(field, value)?;
                Ok(value)
            }
            _ => Err(CheckpointError::Invalid(format!("{} is required", field))),
        }
    }

    async fn pending_writes(&self, key: &CheckpointKey) -> Result<Vec<PendingWrite>> {
        let records = self.backend.scan_writes(key).await?;
        Ok(load_pending_writes(&self.codec, &self.serde, key, records))
    }

    /// One listed tuple; `Ok(None)` when filtered out or corrupt
    async fn list_entry(
        &self,
        key: CheckpointKey,
        record: CheckpointRecord,
        filter: &HashMap<String, serde_json::Value>,
    ) -> Result<Option<CheckpointTuple>> {
        let mut tuple = match assemble_tuple(&self.serde, &key, &record, Vec::new()) {
            Ok(tuple) => tuple,
            Err(e) if e.is_corruption() => {
                tracing::warn!(
                    checkpoint_key = %record.checkpoint_key,
                    error = %e,
                    "Skipping undecodable checkpoint record"
                );
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        if !tuple.metadata.matches(filter) {
            return Ok(None);
        }
        tuple.pending_writes = Some(self.pending_writes(&key).await?);
        Ok(Some(tuple))
    }
}

#[async_trait]
impl<B, S> CheckpointSaver for DocumentCheckpointSaver<B, S>
where
    B: CheckpointRecordStore + WriteRecordStore + 'static,
    S: SerializerProtocol + 'static,
{
    #[tracing::instrument(skip_all, fields(thread_id = ?config.thread_id, checkpoint_id = ?config.checkpoint_id))]
    async fn get_tuple(&self, config: &CheckpointConfig) -> Result<Option<CheckpointTuple>> {
        let inner = &self.inner;
        let thread_id = inner.segment("thread_id", config.thread_id.as_deref())?;
        let checkpoint_ns = inner.config.namespace(config.checkpoint_ns.as_deref());
        inner.codec.check_segment("checkpoint_ns", checkpoint_ns)?;
        let checkpoint_id = config.checkpoint_id.as_deref().filter(|id| !id.is_empty());
        if let Some(checkpoint_id) = checkpoint_id {
            inner.codec.check_segment("checkpoint_id", checkpoint_id)?;
        }

        let Some(key) =
            resolve(&inner.backend, &inner.codec, thread_id, checkpoint_ns, checkpoint_id).await?
        else {
            return Ok(None);
        };
        let Some(record) = inner.backend.get_checkpoint(&key).await? else {
            tracing::debug!(checkpoint_id = %key.checkpoint_id, "Checkpoint not found");
            return Ok(None);
        };
        decode_fetched(&inner.codec, &key, &record)?;

        let pending_writes = inner.pending_writes(&key).await?;
        assemble_tuple(&inner.serde, &key, &record, pending_writes).map(Some)
    }

    #[tracing::instrument(skip_all, fields(thread_id = ?config.and_then(|c| c.thread_id.as_deref()), limit = ?limit))]
    async fn list(
        &self,
        config: Option<&CheckpointConfig>,
        filter: Option<HashMap<String, serde_json::Value>>,
        before: Option<&CheckpointConfig>,
        limit: Option<usize>,
    ) -> Result<CheckpointStream> {
        let inner = Arc::clone(&self.inner);
        let thread_id = inner
            .segment("thread_id", config.and_then(|c| c.thread_id.as_deref()))?
            .to_string();
        let checkpoint_ns = config
            .and_then(|c| c.checkpoint_ns.as_deref())
            .map(|ns| inner.config.namespace(Some(ns)).to_string());
        if let Some(ns) = &checkpoint_ns {
            inner.codec.check_segment("checkpoint_ns", ns)?;
        }
        let before = before.and_then(|b| b.checkpoint_id.as_deref());

        let records = inner
            .backend
            .scan_checkpoints(&thread_id, checkpoint_ns.as_deref())
            .await?;
        let entries = decode_scanned(&inner.codec, &thread_id, checkpoint_ns.as_deref(), records);
        let ordered = order_for_listing(entries, before, None);
        tracing::debug!(candidates = ordered.len(), "Listing checkpoints");

        let filter = Arc::new(filter.unwrap_or_default());
        let stream = stream::iter(ordered)
            .then(move |(key, record)| {
                let inner = Arc::clone(&inner);
                let filter = Arc::clone(&filter);
                async move { inner.list_entry(key, record, &filter).await }
            })
            .filter_map(|entry| future::ready(entry.transpose()))
            .take(limit.unwrap_or(usize::MAX));

        Ok(Box::pin(stream))
    }

    #[tracing::instrument(skip_all, fields(thread_id = ?config.thread_id, checkpoint_id = %checkpoint.id))]
    async fn put(
        &self,
        config: &CheckpointConfig,
        checkpoint: Checkpoint,
        metadata: CheckpointMetadata,
        _new_versions: ChannelVersions,
    ) -> Result<CheckpointConfig> {
        let inner = &self.inner;
        let thread_id = inner.segment("thread_id", config.thread_id.as_deref())?;
        let checkpoint_ns = inner.config.namespace(config.checkpoint_ns.as_deref());
        inner.codec.check_segment("checkpoint_ns", checkpoint_ns)?;
        let checkpoint_id = inner.segment("checkpoint.id", Some(checkpoint.id.as_str()))?;
        let parent_checkpoint_id = config.checkpoint_id.clone().unwrap_or_default();

        let key = CheckpointKey::new(thread_id, checkpoint_ns, checkpoint_id);
        let payload = inner.serde.dumps_typed(&checkpoint)?;
        let record = CheckpointRecord {
            checkpoint_key: inner.codec.encode_checkpoint(&key),
            type_tag: payload.type_tag,
            checkpoint: payload.data,
            metadata: inner.serde.dumps(&metadata)?,
            parent_checkpoint_id,
        };
        inner.backend.upsert_checkpoint(&key, record).await?;

        tracing::debug!(checkpoint_ns, "Stored checkpoint");
        Ok(CheckpointConfig::for_checkpoint(
            key.thread_id,
            key.checkpoint_ns,
            key.checkpoint_id,
        ))
    }

    #[tracing::instrument(skip_all, fields(thread_id = ?config.thread_id, checkpoint_id = ?config.checkpoint_id, task_id = %task_id))]
    async fn put_writes(
        &self,
        config: &CheckpointConfig,
        writes: Vec<(String, serde_json::Value)>,
        task_id: String,
    ) -> Result<()> {
        let inner = &self.inner;
        let thread_id = inner.segment("thread_id", config.thread_id.as_deref())?;
        let checkpoint_ns = inner.config.namespace(config.checkpoint_ns.as_deref());
        inner.codec.check_segment("checkpoint_ns", checkpoint_ns)?;
        let checkpoint_id = inner.segment("checkpoint_id", config.checkpoint_id.as_deref())?;
        let task_id = inner.segment("task_id", Some(task_id.as_str()))?;
        let checkpoint = CheckpointKey::new(thread_id, checkpoint_ns, checkpoint_id);

        let mut pending = Vec::with_capacity(writes.len());
        for (position, (channel, value)) in writes.iter().enumerate() {
            let key = WriteKey::new(&checkpoint, task_id, write_idx(channel, position));
            let encoded = inner.serde.dumps_typed(value)?;
            let record = WriteRecord {
                checkpoint_key: inner.codec.encode_write(&key),
                channel: channel.clone(),
                type_tag: encoded.type_tag,
                value: encoded.data,
            };
            pending.push((key, record));
        }

        // In enumeration order: a later write to the same slot must land last.
        for (key, record) in pending {
            inner.backend.upsert_write(&key, record).await?;
        }

        tracing::debug!(count = writes.len(), "Stored pending writes");
        Ok(())
    }
}
