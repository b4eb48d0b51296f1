//! Contract tests for DocumentCheckpointSaver
//!
//! Every test runs against each backend flavour:
//! - partitioned store with prefix queries
//! - partitioned store without prefix queries (client-side filtering)
//! - nested collections store

mod common;

use async_trait::async_trait;
use common::{checkpoint, collect, fixtures, ids, put, thread};
use futures::StreamExt;
use langgraph_checkpoint::{
    CheckpointConfig, CheckpointError, CheckpointMetadata, CheckpointSaver, CheckpointSource,
    Result,
};
use langgraph_checkpoint_docstore::{
    DocStoreConfig, DocumentCheckpointSaver, InMemoryPartitionedClient, PartitionedClient,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Partitioned client whose first write upsert is slow to land
#[derive(Default)]
struct SlowFirstWrite {
    items: InMemoryPartitionedClient,
    writes_seen: AtomicUsize,
}

#[async_trait]
impl PartitionedClient for SlowFirstWrite {
    async fn upsert_item(&self, partition_key: &str, id: &str, item: Value) -> Result<()> {
        if id.starts_with("writes") && self.writes_seen.fetch_add(1, Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        self.items.upsert_item(partition_key, id, item).await
    }

    async fn read_item(&self, partition_key: &str, id: &str) -> Result<Option<Value>> {
        self.items.read_item(partition_key, id).await
    }

    async fn query_partition(&self, partition_key: &str) -> Result<Vec<Value>> {
        self.items.query_partition(partition_key).await
    }

    async fn query_prefix(&self, partition_key: &str, field: &str, prefix: &str) -> Result<Vec<Value>> {
        self.items.query_prefix(partition_key, field, prefix).await
    }

    fn supports_prefix_query(&self) -> bool {
        false
    }
}

#[tokio::test]
async fn test_put_then_get_round_trip() {
    for fx in fixtures() {
        let saver = &*fx.saver;
        let payload = checkpoint("00001").with_channel_value("messages", json!(["hello"]));
        let metadata = CheckpointMetadata::new()
            .with_source(CheckpointSource::Input)
            .with_step(-1);

        let saved = saver
            .put(&thread("t"), payload.clone(), metadata.clone(), HashMap::new())
            .await
            .unwrap();
        assert_eq!(saved, CheckpointConfig::for_checkpoint("t", "default", "00001"), "{}", fx.name);

        let tuple = saver.get_tuple(&saved).await.unwrap().unwrap();
        assert_eq!(tuple.checkpoint, payload, "{}", fx.name);
        assert_eq!(tuple.metadata, metadata, "{}", fx.name);
        assert_eq!(tuple.config, saved, "{}", fx.name);
        assert_eq!(tuple.pending_writes, Some(vec![]), "{}", fx.name);

        assert_eq!(saver.get(&saved).await.unwrap(), Some(payload), "{}", fx.name);
    }
}

#[tokio::test]
async fn test_put_is_idempotent_per_identity() {
    for fx in fixtures() {
        let saver = &*fx.saver;
        put(saver, &thread("t"), "00001").await;
        let second = checkpoint("00001").with_channel_value("marker", json!("second"));
        saver
            .put(&thread("t"), second.clone(), CheckpointMetadata::new(), HashMap::new())
            .await
            .unwrap();

        let listed = collect(saver, &thread("t"), None, None).await;
        assert_eq!(listed.len(), 1, "{}", fx.name);
        assert_eq!(listed[0].checkpoint, second, "{}", fx.name);
    }
}

#[tokio::test]
async fn test_missing_checkpoint_is_absent() {
    for fx in fixtures() {
        let saver = &*fx.saver;
        assert!(saver.get_tuple(&thread("nobody")).await.unwrap().is_none(), "{}", fx.name);

        put(saver, &thread("t"), "00001").await;
        let unknown = CheckpointConfig::for_checkpoint("t", "default", "99999");
        assert!(saver.get_tuple(&unknown).await.unwrap().is_none(), "{}", fx.name);
        assert!(collect(saver, &thread("nobody"), None, None).await.is_empty(), "{}", fx.name);
    }
}

#[tokio::test]
async fn test_latest_resolution_uses_string_order() {
    for fx in fixtures() {
        let saver = &*fx.saver;
        for id in ["00002", "00010", "00001"] {
            put(saver, &thread("t"), id).await;
        }

        let latest = saver.get_tuple(&thread("t")).await.unwrap().unwrap();
        assert_eq!(latest.config.checkpoint_id.as_deref(), Some("00010"), "{}", fx.name);
    }
}

#[tokio::test]
async fn test_list_is_newest_first_with_before_and_limit() {
    for fx in fixtures() {
        let saver = &*fx.saver;
        for id in ["00001", "00010", "00002"] {
            put(saver, &thread("t"), id).await;
        }

        let all = collect(saver, &thread("t"), None, None).await;
        assert_eq!(ids(&all), ["00010", "00002", "00001"], "{}", fx.name);

        let before = CheckpointConfig::for_checkpoint("t", "default", "00010");
        let older = collect(saver, &thread("t"), Some(&before), None).await;
        assert_eq!(ids(&older), ["00002", "00001"], "{}", fx.name);

        let newest = collect(saver, &thread("t"), None, Some(1)).await;
        assert_eq!(ids(&newest), ["00010"], "{}", fx.name);

        let page = collect(saver, &thread("t"), Some(&before), Some(1)).await;
        assert_eq!(ids(&page), ["00002"], "{}", fx.name);
    }
}

#[tokio::test]
async fn test_parent_linkage() {
    for fx in fixtures() {
        let saver = &*fx.saver;
        let root = put(saver, &thread("t"), "00001").await;
        let child = put(saver, &root, "00002").await;

        let root_tuple = saver.get_tuple(&root).await.unwrap().unwrap();
        assert!(root_tuple.parent_config.is_none(), "{}", fx.name);

        let child_tuple = saver.get_tuple(&child).await.unwrap().unwrap();
        assert_eq!(child_tuple.parent_config, Some(root), "{}", fx.name);
    }
}

#[tokio::test]
async fn test_pending_writes_replay_order() {
    for fx in fixtures() {
        let saver = &*fx.saver;
        let saved = put(saver, &thread("t"), "00001").await;

        let writes: Vec<(String, serde_json::Value)> =
            (0..12).map(|i| (format!("c{i}"), json!(i))).collect();
        saver.put_writes(&saved, writes, "task-a".to_string()).await.unwrap();
        saver
            .put_writes(&saved, vec![("__error__".to_string(), json!("boom"))], "task-b".to_string())
            .await
            .unwrap();

        let pending = saver.get_tuple(&saved).await.unwrap().unwrap().pending_writes.unwrap();
        assert_eq!(pending.len(), 13, "{}", fx.name);
        assert_eq!(pending[0], ("task-b".to_string(), "__error__".to_string(), json!("boom")));
        let channels: Vec<&str> = pending[1..].iter().map(|(_, c, _)| c.as_str()).collect();
        let expected: Vec<String> = (0..12).map(|i| format!("c{i}")).collect();
        assert_eq!(channels, expected, "{}", fx.name);
    }
}

#[tokio::test]
async fn test_rewriting_a_slot_keeps_last_value() {
    for fx in fixtures() {
        let saver = &*fx.saver;
        let saved = put(saver, &thread("t"), "00001").await;

        saver
            .put_writes(&saved, vec![("a".into(), json!(1)), ("b".into(), json!(2))], "task".into())
            .await
            .unwrap();
        saver
            .put_writes(&saved, vec![("a".into(), json!(10))], "task".into())
            .await
            .unwrap();

        let pending = saver.get_tuple(&saved).await.unwrap().unwrap().pending_writes.unwrap();
        assert_eq!(
            pending,
            vec![
                ("task".to_string(), "a".to_string(), json!(10)),
                ("task".to_string(), "b".to_string(), json!(2)),
            ],
            "{}",
            fx.name
        );
    }
}

#[tokio::test]
async fn test_same_slot_in_one_batch_keeps_last_write() {
    for fx in fixtures() {
        let saver = &*fx.saver;
        let saved = put(saver, &thread("t"), "00001").await;
        saver
            .put_writes(
                &saved,
                vec![("__interrupt__".into(), json!("first")), ("__interrupt__".into(), json!("second"))],
                "task".into(),
            )
            .await
            .unwrap();

        let pending = saver.get_tuple(&saved).await.unwrap().unwrap().pending_writes.unwrap();
        assert_eq!(
            pending,
            vec![("task".to_string(), "__interrupt__".to_string(), json!("second"))],
            "{}",
            fx.name
        );
    }
}

#[tokio::test]
async fn test_same_slot_in_one_batch_survives_slow_store() {
    let saver = DocumentCheckpointSaver::partitioned(
        Arc::new(SlowFirstWrite::default()),
        DocStoreConfig::default(),
    )
    .unwrap();
    let saved = put(&saver, &thread("t"), "00001").await;

    saver
        .put_writes(
            &saved,
            vec![("__interrupt__".into(), json!("first")), ("__interrupt__".into(), json!("second"))],
            "task".into(),
        )
        .await
        .unwrap();

    let pending = saver.get_tuple(&saved).await.unwrap().unwrap().pending_writes.unwrap();
    assert_eq!(
        pending,
        vec![("task".to_string(), "__interrupt__".to_string(), json!("second"))]
    );
}

#[tokio::test]
async fn test_writes_stay_with_their_checkpoint() {
    for fx in fixtures() {
        let saver = &*fx.saver;
        let first = put(saver, &thread("t"), "1").await;
        let tenth = put(saver, &first, "10").await;
        saver
            .put_writes(&tenth, vec![("x".into(), json!("ten"))], "task".into())
            .await
            .unwrap();

        let first_tuple = saver.get_tuple(&first).await.unwrap().unwrap();
        assert_eq!(first_tuple.pending_writes, Some(vec![]), "{}", fx.name);
        let tenth_tuple = saver.get_tuple(&tenth).await.unwrap().unwrap();
        assert_eq!(tenth_tuple.pending_writes.map(|w| w.len()), Some(1), "{}", fx.name);
    }
}

#[tokio::test]
async fn test_threads_are_isolated() {
    for fx in fixtures() {
        let saver = &*fx.saver;
        let a = put(saver, &thread("A"), "00005").await;
        saver.put_writes(&a, vec![("x".into(), json!(1))], "task".into()).await.unwrap();
        put(saver, &thread("A1"), "00009").await;
        put(saver, &thread("B"), "00001").await;

        let listed = collect(saver, &thread("B"), None, None).await;
        assert_eq!(ids(&listed), ["00001"], "{}", fx.name);
        assert!(listed.iter().all(|t| t.config.thread_id.as_deref() == Some("B")));

        let latest = saver.get_tuple(&thread("B")).await.unwrap().unwrap();
        assert_eq!(latest.config.checkpoint_id.as_deref(), Some("00001"), "{}", fx.name);
        assert_eq!(latest.pending_writes, Some(vec![]), "{}", fx.name);

        let foreign = CheckpointConfig::for_checkpoint("B", "default", "00005");
        assert!(saver.get_tuple(&foreign).await.unwrap().is_none(), "{}", fx.name);

        assert_eq!(ids(&collect(saver, &thread("A"), None, None).await), ["00005"], "{}", fx.name);
    }
}

#[tokio::test]
async fn test_namespaces_are_scoped() {
    for fx in fixtures() {
        let saver = &*fx.saver;
        put(saver, &thread("t"), "00001").await;
        let sub = thread("t").with_checkpoint_ns("agent".to_string());
        put(saver, &sub, "00002").await;
        let similar = thread("t").with_checkpoint_ns("agent2".to_string());
        put(saver, &similar, "00003").await;

        let root_latest = saver.get_tuple(&thread("t")).await.unwrap().unwrap();
        assert_eq!(root_latest.config.checkpoint_id.as_deref(), Some("00001"), "{}", fx.name);

        let sub_latest = saver.get_tuple(&sub).await.unwrap().unwrap();
        assert_eq!(sub_latest.config.checkpoint_id.as_deref(), Some("00002"), "{}", fx.name);
        assert_eq!(sub_latest.config.checkpoint_ns.as_deref(), Some("agent"));

        assert_eq!(ids(&collect(saver, &sub, None, None).await), ["00002"], "{}", fx.name);
        assert_eq!(
            ids(&collect(saver, &thread("t"), None, None).await),
            ["00003", "00002", "00001"],
            "{}",
            fx.name
        );
        let explicit_default = thread("t").with_checkpoint_ns("default".to_string());
        assert_eq!(ids(&collect(saver, &explicit_default, None, None).await), ["00001"]);
    }
}

#[tokio::test]
async fn test_metadata_filter() {
    for fx in fixtures() {
        let saver = &*fx.saver;
        for (id, step) in [("00001", 1), ("00002", 2), ("00003", 1)] {
            let metadata = CheckpointMetadata::new()
                .with_step(step)
                .with_extra("writer".to_string(), json!("planner"));
            saver
                .put(&thread("t"), checkpoint(id), metadata, HashMap::new())
                .await
                .unwrap();
        }

        let filter = HashMap::from([("step".to_string(), json!(1))]);
        let stream = saver
            .list(Some(&thread("t")), Some(filter), None, Some(1))
            .await
            .unwrap();
        let matched: Vec<_> = stream.map(|t| t.unwrap()).collect().await;
        assert_eq!(ids(&matched), ["00003"], "{}", fx.name);

        let filter = HashMap::from([("writer".to_string(), json!("reviewer"))]);
        let stream = saver.list(Some(&thread("t")), Some(filter), None, None).await.unwrap();
        assert_eq!(stream.count().await, 0, "{}", fx.name);
    }
}

#[tokio::test]
async fn test_corrupt_records_are_skipped_in_listings() {
    for fx in fixtures() {
        let saver = &*fx.saver;
        put(saver, &thread("t"), "00001").await;
        put(saver, &thread("t"), "00003").await;

        fx.backend
            .store_raw_checkpoint(
                "t",
                "default",
                "00002",
                json!({
                    "checkpoint_key": "checkpoint$t$default$00002",
                    "type": "json",
                    "checkpoint": "!!not base64!!",
                    "metadata": "e30=",
                    "parent_checkpoint_id": ""
                }),
            )
            .await;
        fx.backend
            .store_raw_checkpoint(
                "t",
                "default",
                "00004",
                json!({
                    "checkpoint_key": "checkpoint$t$default$00004$extra",
                    "type": "json",
                    "checkpoint": "e30=",
                    "metadata": "e30=",
                    "parent_checkpoint_id": ""
                }),
            )
            .await;

        let listed = collect(saver, &thread("t"), None, None).await;
        assert_eq!(ids(&listed), ["00003", "00001"], "{}", fx.name);

        let latest = saver.get_tuple(&thread("t")).await.unwrap().unwrap();
        assert_eq!(latest.config.checkpoint_id.as_deref(), Some("00003"), "{}", fx.name);

        let explicit = CheckpointConfig::for_checkpoint("t", "default", "00002");
        let err = saver.get_tuple(&explicit).await.unwrap_err();
        assert!(err.is_corruption(), "{}: {err}", fx.name);
    }
}

#[tokio::test]
async fn test_store_unavailable_propagates() {
    for fx in fixtures() {
        let saver = &*fx.saver;
        let saved = put(saver, &thread("t"), "00001").await;
        fx.backend.set_unavailable(true);

        assert!(matches!(
            saver.get_tuple(&saved).await,
            Err(CheckpointError::StoreUnavailable(_))
        ));
        assert!(matches!(
            saver.put(&thread("t"), checkpoint("00002"), CheckpointMetadata::new(), HashMap::new()).await,
            Err(CheckpointError::StoreUnavailable(_))
        ));
        assert!(matches!(
            saver.put_writes(&saved, vec![("a".into(), json!(1))], "task".into()).await,
            Err(CheckpointError::StoreUnavailable(_))
        ));
        assert!(matches!(
            saver.list(Some(&thread("t")), None, None, None).await,
            Err(CheckpointError::StoreUnavailable(_))
        ));

        fx.backend.set_unavailable(false);
        assert!(saver.get_tuple(&saved).await.unwrap().is_some(), "{}", fx.name);
    }
}

#[tokio::test]
async fn test_invalid_input_is_rejected() {
    for fx in fixtures() {
        let saver = &*fx.saver;

        let err = saver
            .put(&thread("a$b"), checkpoint("00001"), CheckpointMetadata::new(), HashMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckpointError::Invalid(_)), "{}", fx.name);

        let ns = thread("t").with_checkpoint_ns("x$y".to_string());
        let err = saver
            .put(&ns, checkpoint("00001"), CheckpointMetadata::new(), HashMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckpointError::Invalid(_)), "{}", fx.name);

        let saved = put(saver, &thread("t"), "00001").await;
        let err = saver
            .put_writes(&saved, vec![("a".into(), json!(1))], "task$1".into())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckpointError::Invalid(_)), "{}", fx.name);

        let err = saver
            .put_writes(&thread("t"), vec![("a".into(), json!(1))], "task".into())
            .await
            .unwrap_err();
        assert!(matches!(err, CheckpointError::Invalid(_)), "{}", fx.name);

        assert!(matches!(
            saver.list(None, None, None, None).await,
            Err(CheckpointError::Invalid(_))
        ));

        let bad_ns = thread("t").with_checkpoint_ns("x$y".to_string());
        assert!(matches!(
            saver.get_tuple(&bad_ns).await,
            Err(CheckpointError::Invalid(_))
        ));
        assert!(matches!(
            saver.list(Some(&bad_ns), None, None, None).await,
            Err(CheckpointError::Invalid(_))
        ));
        let bad_id = CheckpointConfig::for_checkpoint("t", "default", "00001$extra");
        assert!(matches!(
            saver.get_tuple(&bad_id).await,
            Err(CheckpointError::Invalid(_))
        ));
    }
}

#[tokio::test]
async fn test_concurrent_puts_on_distinct_threads() {
    for fx in fixtures() {
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let saver = fx.saver.clone();
                tokio::spawn(async move {
                    let config = common::thread(&format!("thread-{i}"));
                    let saved = common::put(&*saver, &config, "00001").await;
                    saver
                        .put_writes(&saved, vec![("n".into(), json!(i))], "task".into())
                        .await
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        for i in 0..16 {
            let tuple = fx
                .saver
                .get_tuple(&thread(&format!("thread-{i}")))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(
                tuple.pending_writes,
                Some(vec![("task".to_string(), "n".to_string(), json!(i))]),
                "{}",
                fx.name
            );
        }
    }
}
