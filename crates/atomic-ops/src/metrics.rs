//! Process-wide performance aggregate.

use serde::Serialize;

/// Aggregate timing statistics over every executed operation.
///
/// Mutated after every operation completion (success or failure) and read by
/// observability surfaces. Updates must be serialized; here they go through
/// the owning [`StateHandle`](crate::StateHandle)'s single lock.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PerformanceMetrics {
    /// Total operations completed.
    pub operation_count: u64,
    /// Operations slower than the configured slow threshold.
    pub slow_operations: u64,
    /// Running average response time in milliseconds.
    pub average_response_time: f64,
    /// Duration of the most recent operation in milliseconds.
    pub last_operation_ms: u64,
}

impl PerformanceMetrics {
    /// Records one completed operation.
    pub fn record(&mut self, elapsed_ms: u64, slow: bool) {
        self.operation_count += 1;
        if slow {
            self.slow_operations += 1;
        }
        self.average_response_time +=
            (elapsed_ms as f64 - self.average_response_time) / self.operation_count as f64;
        self.last_operation_ms = elapsed_ms;
    }

    /// Resets all counters. Operator action only.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
