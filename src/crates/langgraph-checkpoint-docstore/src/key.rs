//! Composite storage keys for checkpoints and pending writes
//!
//! Every stored record is addressed by a flat string built from its identity
//! tuple, prefixed by a discriminator:
//!
//! ```text
//! checkpoint$<thread_id>$<checkpoint_ns>$<checkpoint_id>
//! writes$<thread_id>$<checkpoint_ns>$<checkpoint_id>$<task_id>$<idx>
//! ```
//!
//! The separator must not occur inside any segment. Encoding does not check
//! this; the saver rejects such segments on the write path with
//! [`KeyCodec::check_segment`].

use langgraph_checkpoint::{CheckpointError, Result};

/// Discriminator of checkpoint keys
pub const CHECKPOINT_TAG: &str = "checkpoint";

/// Discriminator of write keys
pub const WRITES_TAG: &str = "writes";

/// Default key separator
pub const DEFAULT_SEPARATOR: char = '$';

/// Identity of one checkpoint record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CheckpointKey {
    pub thread_id: String,
    pub checkpoint_ns: String,
    pub checkpoint_id: String,
}

impl CheckpointKey {
    pub fn new(
        thread_id: impl Into<String>,
        checkpoint_ns: impl Into<String>,
        checkpoint_id: impl Into<String>,
    ) -> Self {
        Self {
            thread_id: thread_id.into(),
            checkpoint_ns: checkpoint_ns.into(),
            checkpoint_id: checkpoint_id.into(),
        }
    }
}

/// Identity of one pending-write record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WriteKey {
    pub thread_id: String,
    pub checkpoint_ns: String,
    pub checkpoint_id: String,
    pub task_id: String,
    pub idx: i64,
}

impl WriteKey {
    /// Key of the write slot `(task_id, idx)` under `checkpoint`
    pub fn new(checkpoint: &CheckpointKey, task_id: impl Into<String>, idx: i64) -> Self {
        Self {
            thread_id: checkpoint.thread_id.clone(),
            checkpoint_ns: checkpoint.checkpoint_ns.clone(),
            checkpoint_id: checkpoint.checkpoint_id.clone(),
            task_id: task_id.into(),
            idx,
        }
    }

    /// Key of the checkpoint this write belongs to
    pub fn checkpoint(&self) -> CheckpointKey {
        CheckpointKey::new(&self.thread_id, &self.checkpoint_ns, &self.checkpoint_id)
    }
}

/// Encodes and decodes composite keys with a fixed separator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCodec {
    separator: char,
}

impl Default for KeyCodec {
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATOR)
    }
}

impl KeyCodec {
    pub fn new(separator: char) -> Self {
        Self { separator }
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    fn join(&self, segments: &[&str]) -> String {
        let mut buf = [0u8; 4];
        segments.join(&*self.separator.encode_utf8(&mut buf))
    }

    pub fn encode_checkpoint_key(
        &self,
        thread_id: &str,
        checkpoint_ns: &str,
        checkpoint_id: &str,
    ) -> String {
        self.join(&[CHECKPOINT_TAG, thread_id, checkpoint_ns, checkpoint_id])
    }

    pub fn encode_checkpoint(&self, key: &CheckpointKey) -> String {
        self.encode_checkpoint_key(&key.thread_id, &key.checkpoint_ns, &key.checkpoint_id)
    }

    /// Encode a write key; `idx = None` yields the prefix shared by every
    /// write of `task_id`.
    pub fn encode_write_key(
        &self,
        thread_id: &str,
        checkpoint_ns: &str,
        checkpoint_id: &str,
        task_id: &str,
        idx: Option<i64>,
    ) -> String {
        match idx {
            Some(idx) => self.join(&[
                WRITES_TAG,
                thread_id,
                checkpoint_ns,
                checkpoint_id,
                task_id,
                &idx.to_string(),
            ]),
            None => self.join(&[WRITES_TAG, thread_id, checkpoint_ns, checkpoint_id, task_id]),
        }
    }

    pub fn encode_write(&self, key: &WriteKey) -> String {
        self.encode_write_key(
            &key.thread_id,
            &key.checkpoint_ns,
            &key.checkpoint_id,
            &key.task_id,
            Some(key.idx),
        )
    }

    /// Prefix matching every checkpoint key of a thread, or of one namespace
    /// within it. Ends with the separator so `t1` never matches `t10`.
    pub fn checkpoint_prefix(&self, thread_id: &str, checkpoint_ns: Option<&str>) -> String {
        let mut prefix = match checkpoint_ns {
            Some(ns) => self.join(&[CHECKPOINT_TAG, thread_id, ns]),
            None => self.join(&[CHECKPOINT_TAG, thread_id]),
        };
        prefix.push(self.separator);
        prefix
    }

    /// Prefix matching every write key recorded against `checkpoint`
    pub fn checkpoint_writes_prefix(&self, checkpoint: &CheckpointKey) -> String {
        let mut prefix = self.join(&[
            WRITES_TAG,
            &checkpoint.thread_id,
            &checkpoint.checkpoint_ns,
            &checkpoint.checkpoint_id,
        ]);
        prefix.push(self.separator);
        prefix
    }

    pub fn decode_checkpoint_key(&self, key: &str) -> Result<CheckpointKey> {
        match self.split::<4>(key)? {
            [CHECKPOINT_TAG, thread_id, checkpoint_ns, checkpoint_id] => {
                Ok(CheckpointKey::new(thread_id, checkpoint_ns, checkpoint_id))
            }
            [tag, ..] => Err(CheckpointError::malformed_key(
                key,
                format!("expected '{CHECKPOINT_TAG}' discriminator, found '{tag}'"),
            )),
        }
    }

    pub fn decode_write_key(&self, key: &str) -> Result<WriteKey> {
        match self.split::<6>(key)? {
            [WRITES_TAG, thread_id, checkpoint_ns, checkpoint_id, task_id, idx] => {
                let idx = idx.parse::<i64>().map_err(|e| {
                    CheckpointError::malformed_key(key, format!("invalid write index '{idx}': {e}"))
                })?;
                Ok(WriteKey {
                    thread_id: thread_id.to_string(),
                    checkpoint_ns: checkpoint_ns.to_string(),
                    checkpoint_id: checkpoint_id.to_string(),
                    task_id: task_id.to_string(),
                    idx,
                })
            }
            [tag, ..] => Err(CheckpointError::malformed_key(
                key,
                format!("expected '{WRITES_TAG}' discriminator, found '{tag}'"),
            )),
        }
    }

    fn split<'k, const N: usize>(&self, key: &'k str) -> Result<[&'k str; N]> {
        let segments: Vec<&str> = key.split(self.separator).collect();
        let found = segments.len();
        segments.try_into().map_err(|_| {
            CheckpointError::malformed_key(key, format!("expected {} segments, found {}", N, found))
        })
    }

    /// Reject a caller-supplied segment that would corrupt key decoding
    pub fn check_segment(&self, field: &str, value: &str) -> Result<()> {
        if value.contains(self.separator) {
            return Err(CheckpointError::Invalid(format!(
                "{field} '{value}' contains the key separator '{}'",
                self.separator
            )));
        }
        Ok(())
    }
}
