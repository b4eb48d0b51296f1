//! Walk through a pause-and-resume run against both in-memory backends
//!
//! ```text
//! RUST_LOG=langgraph_checkpoint_docstore=debug cargo run --example docstore_demo
//! ```
//!
//! A production deployment swaps the in-memory client for one that wraps a
//! vendor SDK; everything past construction stays the same.

use futures::StreamExt;
use langgraph_checkpoint::{
    Checkpoint, CheckpointConfig, CheckpointMetadata, CheckpointSaver, CheckpointSource,
};
use langgraph_checkpoint_docstore::{
    DocStoreConfig, DocumentCheckpointSaver, InMemoryCollectionClient, InMemoryPartitionedClient,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "langgraph_checkpoint_docstore=info".into()),
        )
        .init();

    let config = DocStoreConfig::from_env()?;
    tracing::info!(separator = %config.key_separator, "Loaded docstore configuration");

    let partitioned =
        DocumentCheckpointSaver::partitioned(Arc::new(InMemoryPartitionedClient::new()), config.clone())?;
    run("partitioned", &partitioned).await?;

    let collections =
        DocumentCheckpointSaver::collections(Arc::new(InMemoryCollectionClient::new()), config)?;
    run("collections", &collections).await?;

    Ok(())
}

async fn run(backend: &str, saver: &dyn CheckpointSaver) -> langgraph_checkpoint::Result<()> {
    println!("=== {backend} ===");
    let thread = CheckpointConfig::new().with_thread_id("support-ticket-42".to_string());

    // Input checkpoint
    let input = saver
        .put(
            &thread,
            Checkpoint::empty().with_channel_value("messages", json!(["refund please"])),
            CheckpointMetadata::new().with_source(CheckpointSource::Input).with_step(-1),
            HashMap::new(),
        )
        .await?;

    // First loop step; the approval task pauses the run
    let step = saver
        .put(
            &input,
            Checkpoint::empty()
                .with_channel_value("messages", json!(["refund please", "checking order"])),
            CheckpointMetadata::new().with_source(CheckpointSource::Loop).with_step(0),
            HashMap::new(),
        )
        .await?;
    saver
        .put_writes(
            &step,
            vec![
                ("draft".to_string(), json!("Refund of $20 approved")),
                ("__interrupt__".to_string(), json!({"value": "approve refund?"})),
            ],
            "approval".to_string(),
        )
        .await?;

    // Resume: the latest checkpoint comes back with its pending writes in replay order
    if let Some(latest) = saver.get_tuple(&thread).await? {
        println!("resuming from {:?}", latest.config.checkpoint_id);
        for (task_id, channel, value) in latest.pending_writes.unwrap_or_default() {
            println!("  replay {task_id}/{channel}: {value}");
        }
    }

    // History, newest first
    let mut history = saver.list(Some(&thread), None, None, None).await?;
    while let Some(tuple) = history.next().await {
        let tuple = tuple?;
        println!(
            "  {:?} step={:?} parent={:?}",
            tuple.config.checkpoint_id,
            tuple.metadata.step,
            tuple.parent_config.and_then(|parent| parent.checkpoint_id)
        );
    }
    Ok(())
}
