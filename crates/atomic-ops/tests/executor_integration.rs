//! Integration tests for the operation execution layer against an
//! in-memory store.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use atomic_ops::{
    ConnectionState, ExecuteOptions, ExecutorConfig, OpError, OperationExecutor, QueueProcessor,
    StateAction, StateHandle, effect_fn, operation_fn,
};
use serde_json::{Value, json};
use store::{InMemoryStore, Store};

struct TestHarness {
    state: StateHandle,
    executor: OperationExecutor,
    processor: QueueProcessor,
    store: InMemoryStore,
}

impl TestHarness {
    fn new() -> Self {
        let state = StateHandle::new();
        let config = ExecutorConfig {
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(8),
            ..ExecutorConfig::default()
        };
        let executor = OperationExecutor::new(state.clone(), config.clone());
        let processor = QueueProcessor::new(state.clone(), config);
        let store = InMemoryStore::new();

        Self {
            state,
            executor,
            processor,
            store,
        }
    }

    async fn disconnect(&self) {
        self.state
            .apply(StateAction::SetConnection(ConnectionState::Disconnected))
            .await;
    }

    async fn reconnect(&self) {
        self.state
            .apply(StateAction::SetConnection(ConnectionState::Connected))
            .await;
    }

    /// An operation body that writes a sale record into the store.
    fn save_sale_op(&self, sale_id: &str) -> atomic_ops::OperationFn {
        let store = self.store.clone();
        let path = format!("sales/{sale_id}");
        operation_fn(move || {
            let store = store.clone();
            let path = path.clone();
            async move {
                store
                    .set(&path, json!({"total_cents": 4500, "customer": "c42"}))
                    .await?;
                Ok(Value::from(path))
            }
        })
    }
}

#[tokio::test]
async fn connected_operation_writes_through() {
    let h = TestHarness::new();

    let outcome = h
        .executor
        .execute("save_sale", h.save_sale_op("s1"), ExecuteOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.into_value(), Some(Value::from("sales/s1")));
    let snap = h.store.get("sales/s1").await.unwrap();
    assert_eq!(snap.val().unwrap()["total_cents"], 4500);
    assert_eq!(h.state.metrics().await.operation_count, 1);
}

#[tokio::test]
async fn offline_operation_queues_then_drains_to_store() {
    let h = TestHarness::new();
    h.disconnect().await;

    let outcome = h
        .executor
        .execute("save_sale", h.save_sale_op("s1"), ExecuteOptions::default())
        .await
        .unwrap();

    // Queued, body never ran, nothing hit the store.
    assert!(outcome.is_queued());
    assert!(!h.store.get("sales/s1").await.unwrap().exists());
    let queue = h.state.get().await.offline_queue;
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].retry_count, 0);

    h.reconnect().await;
    let report = h.processor.process_queue().await;

    assert_eq!(report.succeeded, 1);
    assert_eq!(h.state.queue_len().await, 0);
    assert!(h.store.get("sales/s1").await.unwrap().exists());
}

#[tokio::test]
async fn store_outage_is_retried_transparently() {
    let h = TestHarness::new();

    // Body fails with a network-classified store error twice, then succeeds.
    let attempts = Arc::new(AtomicU32::new(0));
    let op = {
        let store = h.store.clone();
        let attempts = Arc::clone(&attempts);
        operation_fn(move || {
            let store = store.clone();
            let attempts = Arc::clone(&attempts);
            async move {
                if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                    return Err(OpError::network("connection reset"));
                }
                store.set("sales/s2", json!({"total_cents": 900})).await?;
                Ok(Value::Null)
            }
        })
    };

    h.executor
        .execute("save_sale", op, ExecuteOptions::default())
        .await
        .unwrap();

    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    assert!(h.store.get("sales/s2").await.unwrap().exists());
}

#[tokio::test]
async fn queued_operation_exhausting_retries_is_rolled_back() {
    let h = TestHarness::new();
    h.disconnect().await;

    // Keep the store failing so every drain attempt fails too.
    h.store.set_fail_on_write(true).await;

    let rollback_calls = Arc::new(AtomicU32::new(0));
    let rollback = {
        let calls = Arc::clone(&rollback_calls);
        effect_fn(move || {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
    };
    let apply = effect_fn(|| async { Ok(()) });

    let options = ExecuteOptions::default().with_optimistic(apply, rollback);
    h.executor
        .execute("save_sale", h.save_sale_op("s3"), options)
        .await
        .unwrap();

    h.reconnect().await;

    // Three failed drains exhaust the record's budget.
    assert_eq!(h.processor.process_queue().await.requeued, 1);
    assert_eq!(h.processor.process_queue().await.requeued, 1);
    let report = h.processor.process_queue().await;

    assert_eq!(report.dropped, 1);
    assert_eq!(h.state.queue_len().await, 0);
    assert_eq!(rollback_calls.load(Ordering::SeqCst), 1);
    assert!(!h.store.get("sales/s3").await.unwrap().exists());
}

#[tokio::test]
async fn queue_survives_partial_drain() {
    let h = TestHarness::new();
    h.disconnect().await;

    h.executor
        .execute("save_sale", h.save_sale_op("s4"), ExecuteOptions::default())
        .await
        .unwrap();
    h.executor
        .execute("save_sale", h.save_sale_op("s5"), ExecuteOptions::default())
        .await
        .unwrap();

    h.reconnect().await;
    // First record drains against a broken store, second against a healthy
    // one: both are attempted, only the order of outcomes differs per drain.
    h.store.set_fail_on_write(true).await;
    let report = h.processor.process_queue().await;
    assert_eq!(report.processed, 2);
    assert_eq!(report.requeued, 2);

    h.store.set_fail_on_write(false).await;
    let report = h.processor.process_queue().await;
    assert_eq!(report.succeeded, 2);
    assert!(h.store.get("sales/s4").await.unwrap().exists());
    assert!(h.store.get("sales/s5").await.unwrap().exists());
}

#[tokio::test]
async fn metrics_track_every_completion() {
    let h = TestHarness::new();

    h.executor
        .execute("save_sale", h.save_sale_op("s6"), ExecuteOptions::default())
        .await
        .unwrap();

    let _ = h
        .executor
        .execute(
            "save_sale",
            operation_fn(|| async { Err(OpError::validation("invalid quantity")) }),
            ExecuteOptions::default(),
        )
        .await;

    let metrics = h.state.metrics().await;
    assert_eq!(metrics.operation_count, 2);
    assert!(metrics.average_response_time >= 0.0);
}
