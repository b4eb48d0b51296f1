//! Resolution of "which checkpoint" without a secondary index

use crate::key::{CheckpointKey, KeyCodec};
use crate::record::{CheckpointRecord, CheckpointRecordStore};
use langgraph_checkpoint::{CheckpointError, Result};

/// Decode the keys of scanned records, dropping (and logging) corrupt ones
/// and any record outside `(thread_id, checkpoint_ns)`.
pub fn decode_scanned(
    codec: &KeyCodec,
    thread_id: &str,
    checkpoint_ns: Option<&str>,
    records: Vec<CheckpointRecord>,
) -> Vec<(CheckpointKey, CheckpointRecord)> {
    records
        .into_iter()
        .filter_map(|record| match codec.decode_checkpoint_key(&record.checkpoint_key) {
            Ok(key) => Some((key, record)),
            Err(e) => {
                tracing::warn!(
                    thread_id,
                    checkpoint_key = %record.checkpoint_key,
                    error = %e,
                    "Skipping checkpoint record with malformed key"
                );
                None
            }
        })
        .filter(|(key, _)| {
            key.thread_id == thread_id && checkpoint_ns.map_or(true, |ns| key.checkpoint_ns == ns)
        })
        .collect()
}

/// Find the checkpoint addressed by `(thread_id, checkpoint_ns, checkpoint_id)`.
///
/// An explicit id resolves directly, without touching the store; existence is
/// checked by the subsequent point read. Without an id the namespace is
/// scanned and the greatest id under string ordering wins.
pub async fn resolve<S>(
    store: &S,
    codec: &KeyCodec,
    thread_id: &str,
    checkpoint_ns: &str,
    checkpoint_id: Option<&str>,
) -> Result<Option<CheckpointKey>>
where
    S: CheckpointRecordStore + ?Sized,
{
    if let Some(checkpoint_id) = checkpoint_id {
        return Ok(Some(CheckpointKey::new(thread_id, checkpoint_ns, checkpoint_id)));
    }

    let records = store.scan_checkpoints(thread_id, Some(checkpoint_ns)).await?;
    let latest = decode_scanned(codec, thread_id, Some(checkpoint_ns), records)
        .into_iter()
        .map(|(key, _)| key)
        .max_by(|a, b| a.checkpoint_id.cmp(&b.checkpoint_id));

    tracing::debug!(
        thread_id,
        checkpoint_ns,
        latest = ?latest.as_ref().map(|k| k.checkpoint_id.as_str()),
        "Resolved latest checkpoint"
    );
    Ok(latest)
}

/// Keep ids strictly below `before`, newest first, truncated to `limit`
pub fn order_for_listing(
    mut entries: Vec<(CheckpointKey, CheckpointRecord)>,
    before: Option<&str>,
    limit: Option<usize>,
) -> Vec<(CheckpointKey, CheckpointRecord)> {
    if let Some(before) = before {
        entries.retain(|(key, _)| key.checkpoint_id.as_str() < before);
    }
    entries.sort_by(|(a, _), (b, _)| b.checkpoint_id.cmp(&a.checkpoint_id));
    if let Some(limit) = limit {
        entries.truncate(limit);
    }
    entries
}

/// Decode the key of a record fetched by point read, insisting it matches
pub fn decode_fetched(codec: &KeyCodec, expected: &CheckpointKey, record: &CheckpointRecord) -> Result<CheckpointKey> {
    let key = codec.decode_checkpoint_key(&record.checkpoint_key)?;
    if &key != expected {
        return Err(CheckpointError::malformed_key(
            &record.checkpoint_key,
            format!("record stored under '{}'", codec.encode_checkpoint(expected)),
        ));
    }
    Ok(key)
}
