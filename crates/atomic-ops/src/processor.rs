//! Offline queue processor.

use crate::executor::ExecutorConfig;
use crate::state::{StateAction, StateHandle};

/// Summary of one queue drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueReport {
    /// Records attempted this drain.
    pub processed: usize,
    /// Records that completed and were removed.
    pub succeeded: usize,
    /// Records that failed and stayed queued for the next drain.
    pub requeued: usize,
    /// Records dropped after exhausting the retry budget.
    pub dropped: usize,
}

/// Drains the offline queue once connectivity resumes.
///
/// Only one drain is assumed active at a time; preventing re-entrant calls
/// is the caller's responsibility.
pub struct QueueProcessor {
    state: StateHandle,
    config: ExecutorConfig,
}

impl QueueProcessor {
    /// Creates a processor over the given state service.
    pub fn new(state: StateHandle, config: ExecutorConfig) -> Self {
        Self { state, config }
    }

    /// Processes every queued operation in insertion order, one at a time.
    ///
    /// Each record's body runs directly, skipping the connectivity check,
    /// since the drain itself only happens once connectivity is restored.
    /// Success removes the record; failure increments its retry count and
    /// leaves it in place, until the count reaches the budget, at which
    /// point the record is removed and its rollback and fallback (if
    /// present) are both invoked, each contained so a failure of one never
    /// suppresses the other. An individual record failing never aborts the
    /// drain.
    #[tracing::instrument(skip(self))]
    pub async fn process_queue(&self) -> QueueReport {
        let queued = self.state.get().await.offline_queue;
        let mut report = QueueReport::default();

        for record in queued {
            report.processed += 1;

            match (record.op)().await {
                Ok(_) => {
                    self.state.apply(StateAction::RemoveQueued(record.id)).await;
                    report.succeeded += 1;
                    metrics::counter!("offline_queue_completed").increment(1);
                    tracing::info!(
                        operation = %record.name,
                        id = %record.id,
                        "queued operation completed"
                    );
                }
                Err(error) => {
                    let retry_count = record.retry_count + 1;
                    if retry_count >= self.config.max_retries {
                        self.state.apply(StateAction::RemoveQueued(record.id)).await;
                        report.dropped += 1;
                        metrics::counter!("offline_queue_dropped").increment(1);

                        if let Some(rollback) = &record.rollback
                            && let Err(rollback_error) = rollback().await
                        {
                            tracing::error!(
                                operation = %record.name,
                                id = %record.id,
                                error = %rollback_error,
                                "rollback of dropped queued operation failed"
                            );
                        }
                        if let Some(fallback) = &record.fallback
                            && let Err(fallback_error) = fallback().await
                        {
                            tracing::error!(
                                operation = %record.name,
                                id = %record.id,
                                error = %fallback_error,
                                "fallback of dropped queued operation failed"
                            );
                        }

                        tracing::warn!(
                            operation = %record.name,
                            id = %record.id,
                            retry_count,
                            error = %error,
                            "queued operation dropped after exhausting retries"
                        );
                    } else {
                        let mut updated = record.clone();
                        updated.retry_count = retry_count;
                        self.state.apply(StateAction::UpdateQueued(updated)).await;
                        report.requeued += 1;
                        tracing::info!(
                            operation = %record.name,
                            id = %record.id,
                            retry_count,
                            error = %error,
                            "queued operation failed, kept for next drain"
                        );
                    }
                }
            }
        }

        tracing::info!(
            processed = report.processed,
            succeeded = report.succeeded,
            requeued = report.requeued,
            dropped = report.dropped,
            "offline queue drain complete"
        );
        report
    }
}
