//! Connectivity-aware operation execution.
//!
//! [`OperationExecutor::execute`] runs a named operation body against the
//! remote store: connected operations run immediately with bounded retry and
//! capped exponential backoff for transient failures; disconnected
//! operations are queued for the [`QueueProcessor`](crate::QueueProcessor)
//! and the caller receives a typed "queued" result instead of an error. An
//! optional optimistic update is applied before the body and compensated by
//! its paired rollback on the first failure.

use std::time::{Duration, Instant};

use chrono::Utc;
use common::OperationId;
use serde_json::{Map, Value};

use crate::classify::classify;
use crate::error::{OpError, Result};
use crate::record::{EffectFn, OperationFn, OperationRecord};
use crate::state::{StateAction, StateHandle};

/// Tunables for the executor and queue processor.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Additional attempts after the first failure (and the offline queue's
    /// drain budget per record).
    pub max_retries: u32,
    /// Backoff delay for the first retry.
    pub base_delay: Duration,
    /// Ceiling on the backoff delay.
    pub max_delay: Duration,
    /// Operations slower than this are counted and logged at info.
    pub slow_threshold: Duration,
    /// Operations slower than this are logged at warn.
    pub very_slow_threshold: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
            slow_threshold: Duration::from_millis(2000),
            very_slow_threshold: Duration::from_millis(5000),
        }
    }
}

impl ExecutorConfig {
    /// Loads configuration from environment variables, falling back to
    /// defaults.
    ///
    /// Reads `OPS_MAX_RETRIES`, `OPS_BASE_DELAY_MS`, `OPS_MAX_DELAY_MS`,
    /// `OPS_SLOW_MS`, and `OPS_VERY_SLOW_MS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_retries: env_u32("OPS_MAX_RETRIES", defaults.max_retries),
            base_delay: env_ms("OPS_BASE_DELAY_MS", defaults.base_delay),
            max_delay: env_ms("OPS_MAX_DELAY_MS", defaults.max_delay),
            slow_threshold: env_ms("OPS_SLOW_MS", defaults.slow_threshold),
            very_slow_threshold: env_ms("OPS_VERY_SLOW_MS", defaults.very_slow_threshold),
        }
    }

    /// Backoff delay before retry number `attempt` (zero-indexed), doubling
    /// from the base delay up to the ceiling.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay)
    }
}

fn env_u32(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

fn env_ms(name: &str, default: Duration) -> Duration {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}

/// An optimistic update and its compensating rollback.
///
/// The update is applied before the operation body runs (or before the
/// operation is queued, when offline); the rollback is invoked at most once,
/// on the first failure of the body. Both must be idempotent.
#[derive(Clone)]
pub struct OptimisticUpdate {
    /// Applies the tentative state mutation.
    pub apply: EffectFn,
    /// Compensates the tentative mutation after a failure.
    pub rollback: EffectFn,
}

impl OptimisticUpdate {
    /// Pairs an optimistic update with its rollback.
    pub fn new(apply: EffectFn, rollback: EffectFn) -> Self {
        Self { apply, rollback }
    }
}

/// Per-call options for [`OperationExecutor::execute`].
#[derive(Clone, Default)]
pub struct ExecuteOptions {
    /// Optimistic update applied ahead of the operation body.
    pub optimistic: Option<OptimisticUpdate>,
    /// Invoked after the retry budget is exhausted or the error is
    /// non-retryable, before the error is surfaced.
    pub fallback: Option<EffectFn>,
    /// Caller context merged into every surfaced error.
    pub context: Map<String, Value>,
}

impl ExecuteOptions {
    /// Attaches an optimistic update / rollback pair.
    pub fn with_optimistic(mut self, apply: EffectFn, rollback: EffectFn) -> Self {
        self.optimistic = Some(OptimisticUpdate::new(apply, rollback));
        self
    }

    /// Attaches a fallback handler.
    pub fn with_fallback(mut self, fallback: EffectFn) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Attaches a context entry merged into surfaced errors.
    pub fn with_context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }
}

/// The outcome of [`OperationExecutor::execute`].
#[derive(Debug, Clone, PartialEq)]
pub enum Execution {
    /// The operation ran and produced a result.
    Completed(Value),
    /// The store was unreachable; the operation was queued for offline
    /// processing and will be completed (or terminally rolled back) later.
    Queued(OperationId),
}

impl Execution {
    /// Returns true if the operation was queued instead of run.
    pub fn is_queued(&self) -> bool {
        matches!(self, Execution::Queued(_))
    }

    /// The completed result value, if the operation ran.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Execution::Completed(value) => Some(value),
            Execution::Queued(_) => None,
        }
    }
}

/// Runs business operations with connectivity checks, retry, and rollback.
pub struct OperationExecutor {
    state: StateHandle,
    config: ExecutorConfig,
}

impl OperationExecutor {
    /// Creates an executor over the given state service.
    pub fn new(state: StateHandle, config: ExecutorConfig) -> Self {
        Self { state, config }
    }

    /// The state service this executor reports into.
    pub fn state(&self) -> &StateHandle {
        &self.state
    }

    /// Executes a named operation body.
    ///
    /// While disconnected, the optimistic update (if any) is applied, the
    /// body is queued without being run, and `Ok(Execution::Queued)` is
    /// returned. Otherwise the body runs with up to `max_retries` additional
    /// attempts for retryable failures; the surfaced error carries its
    /// classified kind and the merged caller context.
    #[tracing::instrument(skip(self, op, options))]
    pub async fn execute(
        &self,
        name: &str,
        op: OperationFn,
        options: ExecuteOptions,
    ) -> Result<Execution> {
        metrics::counter!("operations_total").increment(1);
        self.state
            .apply(StateAction::MarkPending(name.to_string()))
            .await;

        let outcome = self.run(name, op, options).await;

        self.state
            .apply(StateAction::ClearPending(name.to_string()))
            .await;
        outcome
    }

    async fn run(
        &self,
        name: &str,
        op: OperationFn,
        options: ExecuteOptions,
    ) -> Result<Execution> {
        if !self.state.connection_state().await.is_connected() {
            return self.queue_offline(name, op, &options).await;
        }

        let started = Instant::now();
        let mut optimistic_applied = false;
        if let Some(update) = &options.optimistic {
            (update.apply)().await?;
            optimistic_applied = true;
        }

        let mut attempt: u32 = 0;
        loop {
            match op().await {
                Ok(value) => {
                    self.finish(name, started.elapsed()).await;
                    return Ok(Execution::Completed(value));
                }
                Err(mut error) => {
                    let kind = classify(&error);
                    error.merge_context(&options.context);
                    tracing::error!(
                        operation = name,
                        kind = %kind,
                        attempt,
                        timestamp = %Utc::now().to_rfc3339(),
                        context = %serde_json::Value::Object(error.context_entries().clone()),
                        error = %error,
                        "operation failed"
                    );

                    if optimistic_applied {
                        optimistic_applied = false;
                        if let Some(update) = &options.optimistic
                            && let Err(rollback_error) = (update.rollback)().await
                        {
                            tracing::error!(
                                operation = name,
                                error = %rollback_error,
                                "rollback of optimistic update failed"
                            );
                        }
                    }

                    if kind.is_retryable() && attempt < self.config.max_retries {
                        let delay = self.config.backoff_delay(attempt);
                        tracing::info!(
                            operation = name,
                            attempt = attempt + 1,
                            delay_ms = delay.as_millis() as u64,
                            "retrying after backoff"
                        );
                        metrics::counter!("operation_retries_total").increment(1);
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    if let Some(fallback) = &options.fallback
                        && let Err(fallback_error) = fallback().await
                    {
                        tracing::warn!(
                            operation = name,
                            error = %fallback_error,
                            "fallback handler failed"
                        );
                    }

                    self.finish(name, started.elapsed()).await;
                    return Err(error.into_kind(kind));
                }
            }
        }
    }

    async fn queue_offline(
        &self,
        name: &str,
        op: OperationFn,
        options: &ExecuteOptions,
    ) -> Result<Execution> {
        if let Some(update) = &options.optimistic {
            (update.apply)().await?;
        }

        let mut record = OperationRecord::new(name, op);
        if let Some(update) = &options.optimistic {
            record = record.with_rollback(update.rollback.clone());
        }
        if let Some(fallback) = &options.fallback {
            record = record.with_fallback(fallback.clone());
        }

        let id = record.id;
        self.state.apply(StateAction::EnqueueOffline(record)).await;
        metrics::counter!("operations_queued_offline").increment(1);
        tracing::info!(
            operation = name,
            %id,
            "store unreachable, operation queued for offline processing"
        );
        Ok(Execution::Queued(id))
    }

    async fn finish(&self, name: &str, elapsed: Duration) {
        let elapsed_ms = elapsed.as_millis() as u64;
        let slow = elapsed > self.config.slow_threshold;
        self.state
            .apply(StateAction::RecordOperation { elapsed_ms, slow })
            .await;
        metrics::histogram!("operation_duration_seconds").record(elapsed.as_secs_f64());

        if elapsed > self.config.very_slow_threshold {
            tracing::warn!(operation = name, elapsed_ms, "very slow operation");
        } else if slow {
            tracing::info!(operation = name, elapsed_ms, "slow operation");
        }
    }
}
