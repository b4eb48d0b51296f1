//! Shared fixtures for the saver contract suite

use langgraph_checkpoint::{
    Checkpoint, CheckpointConfig, CheckpointMetadata, CheckpointSaver, CheckpointTuple,
};
use langgraph_checkpoint_docstore::{
    CollectionClient, DocStoreConfig, DocumentCheckpointSaver, InMemoryCollectionClient,
    InMemoryPartitionedClient, KeyCodec, PartitionedClient,
};
use futures::StreamExt;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Raw handle on the client behind a saver
#[derive(Clone)]
pub enum Backend {
    Partitioned(Arc<InMemoryPartitionedClient>),
    Collections(Arc<InMemoryCollectionClient>),
}

pub struct Fixture {
    pub name: &'static str,
    pub saver: Arc<dyn CheckpointSaver>,
    pub backend: Backend,
}

/// One saver per backend flavour, all with default configuration
pub fn fixtures() -> Vec<Fixture> {
    let config = DocStoreConfig::default();

    let partitioned = Arc::new(InMemoryPartitionedClient::new());
    let scan_only = Arc::new(InMemoryPartitionedClient::without_prefix_queries());
    let collections = Arc::new(InMemoryCollectionClient::new());

    vec![
        Fixture {
            name: "partitioned",
            saver: Arc::new(
                DocumentCheckpointSaver::partitioned(partitioned.clone(), config.clone())
                    .expect("valid config"),
            ),
            backend: Backend::Partitioned(partitioned),
        },
        Fixture {
            name: "partitioned-scan-only",
            saver: Arc::new(
                DocumentCheckpointSaver::partitioned(scan_only.clone(), config.clone())
                    .expect("valid config"),
            ),
            backend: Backend::Partitioned(scan_only),
        },
        Fixture {
            name: "collections",
            saver: Arc::new(
                DocumentCheckpointSaver::collections(collections.clone(), config)
                    .expect("valid config"),
            ),
            backend: Backend::Collections(collections),
        },
    ]
}

impl Backend {
    pub fn set_unavailable(&self, unavailable: bool) {
        match self {
            Backend::Partitioned(client) => client.set_unavailable(unavailable),
            Backend::Collections(client) => client.set_unavailable(unavailable),
        }
    }

    /// Store a raw checkpoint document where the saver would look for `(thread, ns, id)`
    pub async fn store_raw_checkpoint(&self, thread_id: &str, ns: &str, id: &str, document: Value) {
        match self {
            Backend::Partitioned(client) => {
                let item_id = KeyCodec::default().encode_checkpoint_key(thread_id, ns, id);
                client.upsert_item(thread_id, &item_id, document).await.unwrap();
            }
            Backend::Collections(client) => {
                client
                    .set_document(&["checkpoints", thread_id, ns, id], document)
                    .await
                    .unwrap();
            }
        }
    }
}

pub fn thread(thread_id: &str) -> CheckpointConfig {
    CheckpointConfig::new().with_thread_id(thread_id.to_string())
}

pub fn checkpoint(id: &str) -> Checkpoint {
    Checkpoint::new(id.to_string(), HashMap::new(), HashMap::new(), HashMap::new())
        .with_channel_value("marker", json!(id))
}

/// Store checkpoint `id` as the child of whatever `parent` addresses
pub async fn put(saver: &dyn CheckpointSaver, parent: &CheckpointConfig, id: &str) -> CheckpointConfig {
    saver
        .put(parent, checkpoint(id), CheckpointMetadata::new(), HashMap::new())
        .await
        .unwrap()
}

pub async fn collect(
    saver: &dyn CheckpointSaver,
    config: &CheckpointConfig,
    before: Option<&CheckpointConfig>,
    limit: Option<usize>,
) -> Vec<CheckpointTuple> {
    let stream = saver.list(Some(config), None, before, limit).await.unwrap();
    stream.map(|tuple| tuple.unwrap()).collect().await
}

pub fn ids(tuples: &[CheckpointTuple]) -> Vec<String> {
    tuples
        .iter()
        .map(|tuple| tuple.config.checkpoint_id.clone().unwrap_or_default())
        .collect()
}
