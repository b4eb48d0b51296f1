//! Reconstruction of [`CheckpointTuple`]s from raw records
//!
//! Pending writes are replayed by the engine in the order returned here, so
//! the ordering is part of the contract:
//!
//! 1. ascending by `idx`, compared numerically (reserved channels carry
//!    negative indexes and come first)
//! 2. one entry per `(task_id, idx)` slot, the last record seen winning
//! 3. records whose key or value cannot be decoded are skipped and logged

use crate::encoding::StorageSerde;
use crate::key::{CheckpointKey, KeyCodec, WriteKey};
use crate::record::{CheckpointRecord, WriteRecord};
use langgraph_checkpoint::{
    Checkpoint, CheckpointConfig, CheckpointMetadata, CheckpointTuple, PendingWrite, Result,
    SerializerProtocol,
};
use std::collections::HashMap;

/// Order, deduplicate and decode the write records of one checkpoint
pub fn load_pending_writes<S: SerializerProtocol>(
    codec: &KeyCodec,
    serde: &StorageSerde<S>,
    checkpoint: &CheckpointKey,
    records: Vec<WriteRecord>,
) -> Vec<PendingWrite> {
    let mut slots: Vec<(WriteKey, WriteRecord)> = records
        .into_iter()
        .filter_map(|record| match codec.decode_write_key(&record.checkpoint_key) {
            Ok(key) if key.checkpoint() == *checkpoint => Some((key, record)),
            Ok(key) => {
                tracing::warn!(
                    write_key = %record.checkpoint_key,
                    owner = %codec.encode_checkpoint(&key.checkpoint()),
                    "Skipping write record stored under another checkpoint"
                );
                None
            }
            Err(e) => {
                tracing::warn!(
                    write_key = %record.checkpoint_key,
                    error = %e,
                    "Skipping write record with malformed key"
                );
                None
            }
        })
        .collect();

    // Stable: among records of equal idx the scan order survives, so the
    // later duplicate of a slot still overwrites the earlier one below.
    slots.sort_by_key(|(key, _)| key.idx);

    let mut position: HashMap<(String, i64), usize> = HashMap::new();
    let mut deduped: Vec<(WriteKey, WriteRecord)> = Vec::with_capacity(slots.len());
    for (key, record) in slots {
        let slot = (key.task_id.clone(), key.idx);
        match position.get(&slot) {
            Some(&at) => deduped[at] = (key, record),
            None => {
                position.insert(slot, deduped.len());
                deduped.push((key, record));
            }
        }
    }

    deduped
        .into_iter()
        .filter_map(|(key, record)| {
            match serde.loads_typed::<serde_json::Value>(&record.type_tag, &record.value) {
                Ok(value) => Some((key.task_id, record.channel, value)),
                Err(e) => {
                    tracing::warn!(
                        write_key = %record.checkpoint_key,
                        error = %e,
                        "Skipping write record with undecodable value"
                    );
                    None
                }
            }
        })
        .collect()
}

/// Build the externally visible tuple for one checkpoint record
pub fn assemble_tuple<S: SerializerProtocol>(
    serde: &StorageSerde<S>,
    key: &CheckpointKey,
    record: &CheckpointRecord,
    pending_writes: Vec<PendingWrite>,
) -> Result<CheckpointTuple> {
    let checkpoint: Checkpoint = serde.loads_typed(&record.type_tag, &record.checkpoint)?;
    let metadata: CheckpointMetadata = serde.loads(&record.metadata)?;

    let config =
        CheckpointConfig::for_checkpoint(&key.thread_id, &key.checkpoint_ns, &key.checkpoint_id);
    let mut tuple = CheckpointTuple::new(config, checkpoint, metadata)
        .with_pending_writes(pending_writes);

    if !record.parent_checkpoint_id.is_empty() {
        tuple = tuple.with_parent_config(CheckpointConfig::for_checkpoint(
            &key.thread_id,
            &key.checkpoint_ns,
            &record.parent_checkpoint_id,
        ));
    }
    Ok(tuple)
}
