//! Explicit state-owning service for the operation layer.
//!
//! Connection state, the offline queue, the pending-operation set, and the
//! performance aggregate live behind one handle that is threaded through the
//! executor and queue processor constructors. Reads snapshot the state;
//! writes go through [`StateAction`]s applied under a single lock, which
//! also serializes metric updates.

use std::collections::HashSet;
use std::sync::Arc;

use common::OperationId;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::metrics::PerformanceMetrics;
use crate::record::OperationRecord;

/// Connectivity to the remote store, as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// The store is reachable; operations run immediately.
    #[default]
    Connected,
    /// The store is unreachable; writes are queued for later processing.
    Disconnected,
}

impl ConnectionState {
    /// Returns true if the store is reachable.
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// The shared state owned by the handle.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// Current connectivity.
    pub connection: ConnectionState,
    /// Deferred operations in insertion order.
    pub offline_queue: Vec<OperationRecord>,
    /// Names of operations currently in flight.
    pub pending: HashSet<String>,
    /// Process-wide performance aggregate.
    pub metrics: PerformanceMetrics,
}

/// A mutation of the shared state.
#[derive(Debug)]
pub enum StateAction {
    /// Records a connectivity change.
    SetConnection(ConnectionState),
    /// Marks an operation as in flight.
    MarkPending(String),
    /// Clears an operation's in-flight marker.
    ClearPending(String),
    /// Appends a deferred operation to the offline queue.
    EnqueueOffline(OperationRecord),
    /// Removes a deferred operation by id.
    RemoveQueued(OperationId),
    /// Replaces a queued record in place (same id, updated retry count).
    UpdateQueued(OperationRecord),
    /// Folds one completed operation into the performance aggregate.
    RecordOperation { elapsed_ms: u64, slow: bool },
    /// Clears the performance aggregate.
    ResetMetrics,
}

/// Handle to the shared operation-layer state.
#[derive(Clone, Default)]
pub struct StateHandle {
    inner: Arc<RwLock<AppState>>,
}

impl StateHandle {
    /// Creates a handle owning fresh state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the current state.
    pub async fn get(&self) -> AppState {
        self.inner.read().await.clone()
    }

    /// Applies a mutation to the state.
    pub async fn apply(&self, action: StateAction) {
        let mut state = self.inner.write().await;
        match action {
            StateAction::SetConnection(connection) => {
                state.connection = connection;
            }
            StateAction::MarkPending(name) => {
                state.pending.insert(name);
            }
            StateAction::ClearPending(name) => {
                state.pending.remove(&name);
            }
            StateAction::EnqueueOffline(record) => {
                state.offline_queue.push(record);
            }
            StateAction::RemoveQueued(id) => {
                state.offline_queue.retain(|record| record.id != id);
            }
            StateAction::UpdateQueued(updated) => {
                if let Some(slot) = state
                    .offline_queue
                    .iter_mut()
                    .find(|record| record.id == updated.id)
                {
                    *slot = updated;
                }
            }
            StateAction::RecordOperation { elapsed_ms, slow } => {
                state.metrics.record(elapsed_ms, slow);
            }
            StateAction::ResetMetrics => {
                state.metrics.reset();
            }
        }
    }

    /// The current connectivity.
    pub async fn connection_state(&self) -> ConnectionState {
        self.inner.read().await.connection
    }

    /// The number of deferred operations in the offline queue.
    pub async fn queue_len(&self) -> usize {
        self.inner.read().await.offline_queue.len()
    }

    /// A snapshot of the performance aggregate.
    pub async fn metrics(&self) -> PerformanceMetrics {
        self.inner.read().await.metrics
    }

    /// Returns true if an operation with this name is in flight.
    pub async fn is_pending(&self, name: &str) -> bool {
        self.inner.read().await.pending.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::operation_fn;
    use serde_json::Value;

    fn record(name: &str) -> OperationRecord {
        OperationRecord::new(name, operation_fn(|| async { Ok(Value::Null) }))
    }

    #[tokio::test]
    async fn connection_defaults_to_connected() {
        let state = StateHandle::new();
        assert_eq!(state.connection_state().await, ConnectionState::Connected);

        state
            .apply(StateAction::SetConnection(ConnectionState::Disconnected))
            .await;
        assert_eq!(
            state.connection_state().await,
            ConnectionState::Disconnected
        );
    }

    #[tokio::test]
    async fn queue_preserves_insertion_order() {
        let state = StateHandle::new();
        state.apply(StateAction::EnqueueOffline(record("first"))).await;
        state.apply(StateAction::EnqueueOffline(record("second"))).await;
        state.apply(StateAction::EnqueueOffline(record("third"))).await;

        let names: Vec<String> = state
            .get()
            .await
            .offline_queue
            .iter()
            .map(|r| r.name.clone())
            .collect();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn remove_queued_deletes_by_id() {
        let state = StateHandle::new();
        let target = record("target");
        let target_id = target.id;
        state.apply(StateAction::EnqueueOffline(record("keep"))).await;
        state.apply(StateAction::EnqueueOffline(target)).await;

        state.apply(StateAction::RemoveQueued(target_id)).await;

        let queue = state.get().await.offline_queue;
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].name, "keep");
    }

    #[tokio::test]
    async fn update_queued_keeps_position() {
        let state = StateHandle::new();
        let target = record("middle");
        let mut updated = target.clone();
        updated.retry_count = 2;

        state.apply(StateAction::EnqueueOffline(record("head"))).await;
        state.apply(StateAction::EnqueueOffline(target)).await;
        state.apply(StateAction::EnqueueOffline(record("tail"))).await;

        state.apply(StateAction::UpdateQueued(updated)).await;

        let queue = state.get().await.offline_queue;
        assert_eq!(queue[1].name, "middle");
        assert_eq!(queue[1].retry_count, 2);
    }

    #[tokio::test]
    async fn pending_markers_are_set_and_cleared() {
        let state = StateHandle::new();
        state
            .apply(StateAction::MarkPending("save_sale".to_string()))
            .await;
        assert!(state.is_pending("save_sale").await);

        state
            .apply(StateAction::ClearPending("save_sale".to_string()))
            .await;
        assert!(!state.is_pending("save_sale").await);
    }

    #[tokio::test]
    async fn record_operation_feeds_metrics() {
        let state = StateHandle::new();
        state
            .apply(StateAction::RecordOperation {
                elapsed_ms: 120,
                slow: false,
            })
            .await;
        state
            .apply(StateAction::RecordOperation {
                elapsed_ms: 2400,
                slow: true,
            })
            .await;

        let metrics = state.metrics().await;
        assert_eq!(metrics.operation_count, 2);
        assert_eq!(metrics.slow_operations, 1);
        assert_eq!(metrics.last_operation_ms, 2400);

        state.apply(StateAction::ResetMetrics).await;
        assert_eq!(state.metrics().await, PerformanceMetrics::default());
    }
}
