//! # langgraph-checkpoint - Checkpoint Contract for Graph Execution
//!
//! **Value types and the storage trait** shared by the graph engine and every
//! checkpoint backend. The engine persists a [`Checkpoint`] after each Pregel
//! superstep and the writes of in-flight tasks as they finish; a backend
//! implements [`CheckpointSaver`] to store and reload them.
//!
//! ## Core Concepts
//!
//! ### 1. CheckpointSaver Trait
//!
//! - **`put()`** - Save a checkpoint as the child of the one addressed by the config
//! - **`put_writes()`** - Record pending writes of one task against a checkpoint
//! - **`get_tuple()`** - Load a checkpoint (latest when no id is given) with its writes
//! - **`list()`** - Stream a thread's history, newest first
//!
//! ### 2. Addressing
//!
//! Every stored checkpoint is addressed by a [`CheckpointConfig`] carrying
//! `thread_id`, `checkpoint_ns` and `checkpoint_id`. Ids sort chronologically
//! as strings; [`Checkpoint::empty`] mints UUIDv7 ids with that property.
//!
//! ### 3. Serialization
//!
//! Payloads pass through a [`SerializerProtocol`] that tags its output with a
//! type string, so a reader can refuse bytes produced by a different encoding.
//! [`JsonSerializer`] is the default.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use langgraph_checkpoint::{Checkpoint, CheckpointConfig, CheckpointMetadata, CheckpointSaver};
//! use std::collections::HashMap;
//!
//! async fn run(saver: impl CheckpointSaver) -> langgraph_checkpoint::Result<()> {
//!     let config = CheckpointConfig::new().with_thread_id("thread-123".to_string());
//!
//!     let checkpoint = Checkpoint::empty().with_channel_value("status", serde_json::json!("active"));
//!     let saved = saver.put(&config, checkpoint, CheckpointMetadata::new(), HashMap::new()).await?;
//!
//!     saver
//!         .put_writes(&saved, vec![("messages".into(), serde_json::json!("hi"))], "task-1".into())
//!         .await?;
//!
//!     if let Some(tuple) = saver.get_tuple(&config).await? {
//!         println!("latest: {:?}", tuple.config.checkpoint_id);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │              Graph engine (Pregel supersteps)           │
//! └────────────────────┬────────────────────────────────────┘
//!                      │ put() / put_writes() / get_tuple() / list()
//!                      ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │           CheckpointSaver Trait (This Crate)            │
//! └────────────────────┬────────────────────────────────────┘
//!                      │ Implemented by
//!                      ▼
//!  ┌──────────────────────────────────────────────────────┐
//!  │  langgraph-checkpoint-docstore (document stores)     │
//!  └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`checkpoint`] - [`Checkpoint`], [`CheckpointConfig`], [`CheckpointMetadata`], [`CheckpointTuple`]
//! - [`traits`] - [`CheckpointSaver`] trait and [`CheckpointStream`]
//! - [`serializer`] - [`SerializerProtocol`] and [`JsonSerializer`]
//! - [`error`] - [`CheckpointError`] types

pub mod checkpoint;
pub mod error;
pub mod serializer;
pub mod traits;

// Re-export main types
pub use checkpoint::{
    ChannelVersion, ChannelVersions, Checkpoint, CheckpointConfig, CheckpointId,
    CheckpointMetadata, CheckpointSource, CheckpointTuple, PendingWrite,
};
pub use error::{CheckpointError, Result};
pub use serializer::{JsonSerializer, SerializerProtocol};
pub use traits::{CheckpointSaver, CheckpointStream};
