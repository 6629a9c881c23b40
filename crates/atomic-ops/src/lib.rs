//! Atomic operation layer for the point-of-sale core.
//!
//! This crate wraps business operations against the remote store with:
//! - error classification into a five-kind taxonomy with retryability rules
//! - connectivity-aware execution: operations started while disconnected are
//!   queued for later processing instead of failing outright
//! - bounded retry with capped exponential backoff for transient failures
//! - optimistic update / rollback as a compensating-transaction pair
//! - an offline queue processor that drains deferred operations in FIFO
//!   order once connectivity resumes
//! - process-wide performance tracking for observability surfaces
//!
//! State (connection, queue, pending set, metrics) is owned by an explicit
//! [`StateHandle`] service threaded through the constructors; there are no
//! ambient singletons.

pub mod classify;
pub mod error;
pub mod executor;
pub mod metrics;
pub mod processor;
pub mod record;
pub mod state;

pub use classify::{classify, should_retry};
pub use error::{ErrorKind, OpError, Result};
pub use executor::{
    ExecuteOptions, Execution, ExecutorConfig, OperationExecutor, OptimisticUpdate,
};
pub use metrics::PerformanceMetrics;
pub use processor::{QueueProcessor, QueueReport};
pub use record::{EffectFn, OperationFn, OperationRecord, effect_fn, operation_fn};
pub use state::{AppState, ConnectionState, StateAction, StateHandle};
