//! Deferred operation records for the offline queue.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::OperationId;
use serde_json::Value;

use crate::Result;

/// Boxed future returned by a stored operation body.
pub type BoxedOpFuture = Pin<Box<dyn Future<Output = Result<Value>> + Send>>;

/// A repeatable operation body.
///
/// Stored in [`OperationRecord`]s so the queue processor can re-run the
/// operation on every drain; must therefore produce a fresh future per call.
pub type OperationFn = Arc<dyn Fn() -> BoxedOpFuture + Send + Sync>;

/// Boxed future returned by a compensating effect.
pub type BoxedEffectFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;

/// A side effect without a result: optimistic update, rollback, or fallback.
pub type EffectFn = Arc<dyn Fn() -> BoxedEffectFuture + Send + Sync>;

/// Wraps an async closure as an [`OperationFn`].
pub fn operation_fn<F, Fut>(f: F) -> OperationFn
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    Arc::new(move || Box::pin(f()))
}

/// Wraps an async closure as an [`EffectFn`].
pub fn effect_fn<F, Fut>(f: F) -> EffectFn
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(move || Box::pin(f()))
}

/// A deferred operation awaiting connectivity.
///
/// Created when an operation cannot run immediately (offline). Owned
/// exclusively by the offline queue inside the state service; `retry_count`
/// is incremented only by the queue processor; removed on success or after
/// the retry budget is exhausted.
#[derive(Clone)]
pub struct OperationRecord {
    /// Unique identifier for this record.
    pub id: OperationId,
    /// Operation name, for logs and the pending-operation set.
    pub name: String,
    /// The operation body to re-run when connectivity resumes.
    pub op: OperationFn,
    /// When the record was queued.
    pub queued_at: DateTime<Utc>,
    /// Failed drain attempts so far.
    pub retry_count: u32,
    /// Compensator for the optimistic update applied when this was queued.
    pub rollback: Option<EffectFn>,
    /// Last-resort handler invoked when the record is dropped.
    pub fallback: Option<EffectFn>,
}

impl OperationRecord {
    /// Creates a fresh record for an operation body.
    pub fn new(name: impl Into<String>, op: OperationFn) -> Self {
        Self {
            id: OperationId::new(),
            name: name.into(),
            op,
            queued_at: Utc::now(),
            retry_count: 0,
            rollback: None,
            fallback: None,
        }
    }

    /// Attaches a rollback compensator.
    pub fn with_rollback(mut self, rollback: EffectFn) -> Self {
        self.rollback = Some(rollback);
        self
    }

    /// Attaches a fallback handler.
    pub fn with_fallback(mut self, fallback: EffectFn) -> Self {
        self.fallback = Some(fallback);
        self
    }
}

impl std::fmt::Debug for OperationRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationRecord")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("queued_at", &self.queued_at)
            .field("retry_count", &self.retry_count)
            .field("has_rollback", &self.rollback.is_some())
            .field("has_fallback", &self.fallback.is_some())
            .finish()
    }
}
