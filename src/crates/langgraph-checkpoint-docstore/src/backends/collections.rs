//! Hierarchical document stores with nested collections
//!
//! Paths alternate collection and document ids. Each checkpoint and each
//! write slot gets its own document:
//!
//! ```text
//! <checkpoints>/<thread_id>/<checkpoint_ns>/<checkpoint_id>
//! <writes>/<thread_id>/<checkpoint_ns>/<checkpoint_id>/entries/<task_id><sep><idx>
//! ```
//!
//! Scans list the documents of one collection, so neither checkpoints nor
//! writes need a query engine.

use crate::config::DocStoreConfig;
use crate::key::{CheckpointKey, KeyCodec, WriteKey};
use crate::record::{CheckpointRecord, CheckpointRecordStore, WriteRecord, WriteRecordStore};
use async_trait::async_trait;
use langgraph_checkpoint::{CheckpointError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Collection holding the write documents of one checkpoint
pub const WRITES_SUBCOLLECTION: &str = "entries";

/// Client of a hierarchical document store
///
/// A document path has an even number of segments, a collection path an odd
/// number. Failures surface as [`CheckpointError::StoreUnavailable`].
#[async_trait]
pub trait CollectionClient: Send + Sync {
    /// Create or replace the document at `path`
    async fn set_document(&self, path: &[&str], document: Value) -> Result<()>;

    async fn get_document(&self, path: &[&str]) -> Result<Option<Value>>;

    /// Documents directly inside `collection`
    async fn list_documents(&self, collection: &[&str]) -> Result<Vec<Value>>;

    /// Ids of the collections directly below `document`
    async fn list_collections(&self, document: &[&str]) -> Result<Vec<String>>;
}

/// Record stores over a [`CollectionClient`]
pub struct CollectionStore<C: ?Sized> {
    client: Arc<C>,
    codec: KeyCodec,
    checkpoints_collection: String,
    writes_collection: String,
}

impl<C: CollectionClient + ?Sized> CollectionStore<C> {
    pub fn new(client: Arc<C>, config: &DocStoreConfig) -> Self {
        Self {
            client,
            codec: config.codec(),
            checkpoints_collection: config.checkpoints_collection.clone(),
            writes_collection: config.writes_collection.clone(),
        }
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    fn write_document_id(&self, key: &WriteKey) -> String {
        format!("{}{}{}", key.task_id, self.codec.separator(), key.idx)
    }

    async fn list_records<T: DeserializeOwned>(&self, collection: &[&str]) -> Result<Vec<T>> {
        let documents = self.client.list_documents(collection).await?;
        Ok(documents
            .into_iter()
            .filter_map(|document| match serde_json::from_value::<T>(document) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(
                        collection = %collection.join("/"),
                        error = %e,
                        "Skipping undecodable document"
                    );
                    None
                }
            })
            .collect())
    }
}

#[async_trait]
impl<C: CollectionClient + ?Sized> CheckpointRecordStore for CollectionStore<C> {
    async fn upsert_checkpoint(&self, key: &CheckpointKey, record: CheckpointRecord) -> Result<()> {
        let path: [&str; 4] = [
            self.checkpoints_collection.as_str(),
            &key.thread_id,
            &key.checkpoint_ns,
            &key.checkpoint_id,
        ];
        self.client
            .set_document(&path, serde_json::to_value(record)?)
            .await
    }

    async fn get_checkpoint(&self, key: &CheckpointKey) -> Result<Option<CheckpointRecord>> {
        let path: [&str; 4] = [
            self.checkpoints_collection.as_str(),
            &key.thread_id,
            &key.checkpoint_ns,
            &key.checkpoint_id,
        ];
        match self.client.get_document(&path).await? {
            Some(document) => Ok(Some(serde_json::from_value(document)?)),
            None => Ok(None),
        }
    }

    async fn scan_checkpoints(
        &self,
        thread_id: &str,
        checkpoint_ns: Option<&str>,
    ) -> Result<Vec<CheckpointRecord>> {
        let thread: [&str; 2] = [&self.checkpoints_collection, thread_id];
        let namespaces = match checkpoint_ns {
            Some(ns) => vec![ns.to_string()],
            None => self.client.list_collections(&thread).await?,
        };

        let mut records = Vec::new();
        for ns in &namespaces {
            let collection: [&str; 3] = [thread[0], thread[1], ns];
            records.extend(self.list_records(&collection).await?);
        }
        Ok(records)
    }
}

#[async_trait]
impl<C: CollectionClient + ?Sized> WriteRecordStore for CollectionStore<C> {
    async fn upsert_write(&self, key: &WriteKey, record: WriteRecord) -> Result<()> {
        let document_id = self.write_document_id(key);
        let path: [&str; 6] = [
            self.writes_collection.as_str(),
            &key.thread_id,
            &key.checkpoint_ns,
            &key.checkpoint_id,
            WRITES_SUBCOLLECTION,
            &document_id,
        ];
        self.client
            .set_document(&path, serde_json::to_value(record)?)
            .await
    }

    async fn scan_writes(&self, checkpoint: &CheckpointKey) -> Result<Vec<WriteRecord>> {
        let collection: [&str; 5] = [
            &self.writes_collection,
            &checkpoint.thread_id,
            &checkpoint.checkpoint_ns,
            &checkpoint.checkpoint_id,
            WRITES_SUBCOLLECTION,
        ];
        self.list_records(&collection).await
    }
}

/// In-process [`CollectionClient`] for development, tests and benches
#[derive(Debug, Default)]
pub struct InMemoryCollectionClient {
    documents: RwLock<BTreeMap<Vec<String>, Value>>,
    unavailable: AtomicBool,
}

impl InMemoryCollectionClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `StoreUnavailable` (or recover)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn document_count(&self) -> usize {
        self.documents.read().await.len()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CheckpointError::StoreUnavailable(
                "in-memory collection store is offline".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_path(path: &[&str], document: bool) -> Result<Vec<String>> {
    let parity_ok = if document {
        path.len() % 2 == 0
    } else {
        path.len() % 2 == 1
    };
    if path.is_empty() || !parity_ok || path.iter().any(|segment| segment.is_empty()) {
        let kind = if document { "document" } else { "collection" };
        return Err(CheckpointError::Invalid(format!(
            "'{}' is not a valid {} path",
            path.join("/"),
            kind
        )));
    }
    Ok(path.iter().map(|segment| segment.to_string()).collect())
}

fn has_prefix(candidate: &[String], prefix: &[String]) -> bool {
    candidate.len() > prefix.len() && candidate[..prefix.len()] == *prefix
}

#[async_trait]
impl CollectionClient for InMemoryCollectionClient {
    async fn set_document(&self, path: &[&str], document: Value) -> Result<()> {
        self.check_available()?;
        let path = check_path(path, true)?;
        self.documents.write().await.insert(path, document);
        Ok(())
    }

    async fn get_document(&self, path: &[&str]) -> Result<Option<Value>> {
        self.check_available()?;
        let path = check_path(path, true)?;
        Ok(self.documents.read().await.get(&path).cloned())
    }

    async fn list_documents(&self, collection: &[&str]) -> Result<Vec<Value>> {
        self.check_available()?;
        let collection = check_path(collection, false)?;
        Ok(self
            .documents
            .read()
            .await
            .range(collection.clone()..)
            .take_while(|(path, _)| has_prefix(path, &collection))
            .filter(|(path, _)| path.len() == collection.len() + 1)
            .map(|(_, document)| document.clone())
            .collect())
    }

    async fn list_collections(&self, document: &[&str]) -> Result<Vec<String>> {
        self.check_available()?;
        let document = check_path(document, true)?;
        let ids: BTreeSet<String> = self
            .documents
            .read()
            .await
            .range(document.clone()..)
            .take_while(|(path, _)| path.as_slice() == document.as_slice() || has_prefix(path, &document))
            .filter(|(path, _)| has_prefix(path, &document))
            .map(|(path, _)| path[document.len()].clone())
            .collect();
        Ok(ids.into_iter().collect())
    }
}
