//! Flat, partitioned document stores
//!
//! The store offers one container of JSON items, partitioned by a key and
//! unique by `id` within a partition. Checkpoints and writes share the
//! container:
//!
//! ```text
//! partition "<thread_id>"
//!   ├─ id "checkpoint$<thread>$<ns>$<checkpoint_id>"          (checkpoint record)
//!   └─ id "writes$<thread>$<ns>$<checkpoint_id>$<task>$<idx>" (write record)
//! ```
//!
//! Scans are prefix queries on the `checkpoint_key` field. A store without
//! prefix queries is served by fetching the whole partition and filtering
//! client-side.

use crate::key::{CheckpointKey, KeyCodec, WriteKey};
use crate::record::{CheckpointRecord, CheckpointRecordStore, WriteRecord, WriteRecordStore};
use async_trait::async_trait;
use langgraph_checkpoint::{CheckpointError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Field every scan filters on
pub const KEY_FIELD: &str = "checkpoint_key";

/// Client of a partitioned document store
///
/// Implemented over the vendor SDK; connection, authentication and retries
/// live behind it. Failures surface as [`CheckpointError::StoreUnavailable`].
#[async_trait]
pub trait PartitionedClient: Send + Sync {
    /// Insert or replace the item `id` in `partition_key`
    async fn upsert_item(&self, partition_key: &str, id: &str, item: Value) -> Result<()>;

    async fn read_item(&self, partition_key: &str, id: &str) -> Result<Option<Value>>;

    /// Every item of the partition
    async fn query_partition(&self, partition_key: &str) -> Result<Vec<Value>>;

    /// Items of the partition whose string `field` starts with `prefix`
    async fn query_prefix(&self, partition_key: &str, field: &str, prefix: &str) -> Result<Vec<Value>>;

    fn supports_prefix_query(&self) -> bool {
        true
    }
}

/// Record stores over a [`PartitionedClient`]
pub struct PartitionedStore<C: ?Sized> {
    client: Arc<C>,
    codec: KeyCodec,
}

impl<C: PartitionedClient + ?Sized> PartitionedStore<C> {
    pub fn new(client: Arc<C>, codec: KeyCodec) -> Self {
        Self { client, codec }
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    async fn query_records<T: DeserializeOwned>(&self, partition_key: &str, prefix: &str) -> Result<Vec<T>> {
        let items = if self.client.supports_prefix_query() {
            self.client.query_prefix(partition_key, KEY_FIELD, prefix).await?
        } else {
            let mut items = self.client.query_partition(partition_key).await?;
            items.retain(|item| key_of(item).is_some_and(|key| key.starts_with(prefix)));
            items
        };

        Ok(items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<T>(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(partition_key, prefix, error = %e, "Skipping undecodable item");
                    None
                }
            })
            .collect())
    }
}

fn key_of(item: &Value) -> Option<&str> {
    item.get(KEY_FIELD).and_then(Value::as_str)
}

#[async_trait]
impl<C: PartitionedClient + ?Sized> CheckpointRecordStore for PartitionedStore<C> {
    async fn upsert_checkpoint(&self, key: &CheckpointKey, record: CheckpointRecord) -> Result<()> {
        let id = self.codec.encode_checkpoint(key);
        self.client
            .upsert_item(&key.thread_id, &id, serde_json::to_value(record)?)
            .await
    }

    async fn get_checkpoint(&self, key: &CheckpointKey) -> Result<Option<CheckpointRecord>> {
        let id = self.codec.encode_checkpoint(key);
        match self.client.read_item(&key.thread_id, &id).await? {
            Some(item) => Ok(Some(serde_json::from_value(item)?)),
            None => Ok(None),
        }
    }

    async fn scan_checkpoints(
        &self,
        thread_id: &str,
        checkpoint_ns: Option<&str>,
    ) -> Result<Vec<CheckpointRecord>> {
        let prefix = self.codec.checkpoint_prefix(thread_id, checkpoint_ns);
        self.query_records(thread_id, &prefix).await
    }
}

#[async_trait]
impl<C: PartitionedClient + ?Sized> WriteRecordStore for PartitionedStore<C> {
    async fn upsert_write(&self, key: &WriteKey, record: WriteRecord) -> Result<()> {
        let id = self.codec.encode_write(key);
        self.client
            .upsert_item(&key.thread_id, &id, serde_json::to_value(record)?)
            .await
    }

    async fn scan_writes(&self, checkpoint: &CheckpointKey) -> Result<Vec<WriteRecord>> {
        let prefix = self.codec.checkpoint_writes_prefix(checkpoint);
        self.query_records(&checkpoint.thread_id, &prefix).await
    }
}

/// In-process [`PartitionedClient`] for development, tests and benches
#[derive(Debug, Default)]
pub struct InMemoryPartitionedClient {
    partitions: RwLock<HashMap<String, BTreeMap<String, Value>>>,
    prefix_queries: bool,
    unavailable: AtomicBool,
}

impl InMemoryPartitionedClient {
    pub fn new() -> Self {
        Self {
            prefix_queries: true,
            ..Self::default()
        }
    }

    /// A client that only supports whole-partition queries
    pub fn without_prefix_queries() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `StoreUnavailable` (or recover)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of items across all partitions
    pub async fn item_count(&self) -> usize {
        self.partitions.read().await.values().map(BTreeMap::len).sum()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CheckpointError::StoreUnavailable(
                "in-memory partitioned store is offline".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl PartitionedClient for InMemoryPartitionedClient {
    async fn upsert_item(&self, partition_key: &str, id: &str, item: Value) -> Result<()> {
        self.check_available()?;
        self.partitions
            .write()
            .await
            .entry(partition_key.to_string())
            .or_default()
            .insert(id.to_string(), item);
        Ok(())
    }

    async fn read_item(&self, partition_key: &str, id: &str) -> Result<Option<Value>> {
        self.check_available()?;
        Ok(self
            .partitions
            .read()
            .await
            .get(partition_key)
            .and_then(|items| items.get(id))
            .cloned())
    }

    async fn query_partition(&self, partition_key: &str) -> Result<Vec<Value>> {
        self.check_available()?;
        Ok(self
            .partitions
            .read()
            .await
            .get(partition_key)
            .map(|items| items.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn query_prefix(&self, partition_key: &str, field: &str, prefix: &str) -> Result<Vec<Value>> {
        self.check_available()?;
        if !self.prefix_queries {
            return Err(CheckpointError::StoreUnavailable(
                "prefix queries are not supported by this store".to_string(),
            ));
        }
        Ok(self
            .partitions
            .read()
            .await
            .get(partition_key)
            .map(|items| {
                items
                    .values()
                    .filter(|item| {
                        item.get(field)
                            .and_then(Value::as_str)
                            .is_some_and(|value| value.starts_with(prefix))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn supports_prefix_query(&self) -> bool {
        self.prefix_queries
    }
}
