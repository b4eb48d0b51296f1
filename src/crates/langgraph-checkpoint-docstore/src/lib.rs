//! # langgraph-checkpoint-docstore - Checkpoints in Document Stores
//!
//! A [`CheckpointSaver`](langgraph_checkpoint::CheckpointSaver) for schemaless
//! document databases that offer point reads, upserts and some form of scan,
//! but no secondary indexes and no multi-document transactions.
//!
//! ## How Records Are Addressed
//!
//! Every record carries a composite string key built by the [`KeyCodec`]:
//!
//! ```text
//! checkpoint$<thread_id>$<checkpoint_ns>$<checkpoint_id>
//! writes$<thread_id>$<checkpoint_ns>$<checkpoint_id>$<task_id>$<idx>
//! ```
//!
//! - **Latest checkpoint** - scan the `(thread, namespace)` prefix and take the
//!   greatest id; ids sort chronologically as strings, so no pointer record is
//!   kept
//! - **History** - the same scan, filtered by `before`, sorted newest first
//! - **Pending writes** - scan the checkpoint's write prefix, order by `idx`
//!
//! ## Backends
//!
//! | Backend | Client trait | Layout |
//! |---------|--------------|--------|
//! | Partitioned | [`PartitionedClient`] | one container, partition = thread, id = full key |
//! | Collections | [`CollectionClient`] | `checkpoints/<thread>/<ns>/<id>`, one document per write |
//!
//! Both ship an in-memory client for development and tests. Production clients
//! wrap a vendor SDK and are injected behind an `Arc`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use langgraph_checkpoint::{Checkpoint, CheckpointConfig, CheckpointMetadata, CheckpointSaver};
//! use langgraph_checkpoint_docstore::{DocStoreConfig, DocumentCheckpointSaver, InMemoryCollectionClient};
//! use std::{collections::HashMap, sync::Arc};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let saver = DocumentCheckpointSaver::collections(
//!         Arc::new(InMemoryCollectionClient::new()),
//!         DocStoreConfig::from_env()?,
//!     )?;
//!
//!     let thread = CheckpointConfig::new().with_thread_id("thread-1".to_string());
//!     let first = saver
//!         .put(&thread, Checkpoint::empty(), CheckpointMetadata::new().with_step(0), HashMap::new())
//!         .await?;
//!     saver
//!         .put(&first, Checkpoint::empty(), CheckpointMetadata::new().with_step(1), HashMap::new())
//!         .await?;
//!
//!     let mut history = saver.list(Some(&thread), None, None, None).await?;
//!     while let Some(tuple) = history.next().await {
//!         let tuple = tuple?;
//!         println!("{:?} <- {:?}", tuple.config.checkpoint_id, tuple.parent_config);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`key`] - composite key encoding and decoding
//! - [`encoding`] - typed, base64-escaped payloads
//! - [`record`] - stored record layout and the backend store traits
//! - [`resolver`] - latest-checkpoint resolution and listing order
//! - [`assembler`] - tuple reconstruction and pending-write ordering
//! - [`saver`] - [`DocumentCheckpointSaver`]
//! - [`backends`] - partitioned and nested-collection adapters
//! - [`config`] - [`DocStoreConfig`]

pub mod assembler;
pub mod backends;
pub mod config;
pub mod encoding;
pub mod key;
pub mod record;
pub mod resolver;
pub mod saver;

pub use backends::{
    CollectionClient, CollectionStore, InMemoryCollectionClient, InMemoryPartitionedClient,
    PartitionedClient, PartitionedStore,
};
pub use config::DocStoreConfig;
pub use encoding::{EncodedValue, StorageSerde};
pub use key::{CheckpointKey, KeyCodec, WriteKey};
pub use record::{CheckpointRecord, CheckpointRecordStore, WriteRecord, WriteRecordStore};
pub use saver::{reserved_write_idx, write_idx, DocumentCheckpointSaver};
