//! FIFO stock reduction with per-batch locking.

use serde_json::json;
use store::{LockService, Store};

use crate::error::{InventoryError, Result};
use crate::fabric::{BatchItem, Fabric};
use crate::sale::{AllocationPlan, BatchTake, SaleLine};
use crate::value_objects::BatchId;

const FABRICS_PATH: &str = "fabrics";

/// Reduces fabric stock oldest-batch-first, one lock per touched batch.
///
/// Each sale line either fully succeeds, with every take persisted, or
/// persists nothing; in both cases every lock acquired for the line is
/// released before the next line (or the caller) sees control again.
/// Mutual exclusion across concurrent sales is the lock service's job;
/// this component only guarantees it never touches a batch it has not
/// locked and never leaves a batch locked behind.
pub struct InventoryAllocator<S: Store, L: LockService> {
    store: S,
    locks: L,
}

impl<S: Store, L: LockService> InventoryAllocator<S, L> {
    /// Creates an allocator over the given store and lock service.
    pub fn new(store: S, locks: L) -> Self {
        Self { store, locks }
    }

    /// Reduces stock for every sale line, returning the per-line plans.
    ///
    /// Lines are resolved one at a time; a line only starts after the
    /// previous line's locks are all released. Lines persisted before a
    /// later line fails stay persisted.
    #[tracing::instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn reduce_inventory(&self, lines: &[SaleLine]) -> Result<Vec<AllocationPlan>> {
        metrics::counter!("inventory_reductions_total").increment(1);
        let started = std::time::Instant::now();

        let mut plans = Vec::with_capacity(lines.len());
        for line in lines {
            line.validate()?;

            let mut locked: Vec<BatchId> = Vec::new();
            let outcome = self.reduce_line(line, &mut locked).await;
            // Guaranteed release on every exit path: success, insufficient
            // stock, lock denial, and persistence failure all pass here.
            self.release_all(&locked).await;

            match outcome {
                Ok(plan) => plans.push(plan),
                Err(error) => {
                    metrics::counter!("inventory_reduction_failures").increment(1);
                    tracing::warn!(
                        fabric_id = %line.fabric_id,
                        color = %line.color,
                        quantity = line.quantity,
                        error = %error,
                        "inventory reduction failed"
                    );
                    return Err(error);
                }
            }
        }

        metrics::histogram!("inventory_reduction_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        Ok(plans)
    }

    async fn reduce_line(&self, line: &SaleLine, locked: &mut Vec<BatchId>) -> Result<AllocationPlan> {
        // Fresh read per line: a concurrent sale may have changed batch
        // state since the previous line.
        let fabric_path = format!("{FABRICS_PATH}/{}", line.fabric_id);
        let snapshot = self.store.get(&fabric_path).await?;
        if !snapshot.exists() {
            return Err(InventoryError::FabricNotFound(line.fabric_id));
        }
        let fabric: Fabric = snapshot.to()?;

        let candidates = fabric.fifo_candidates(&line.color);
        let available: f64 = candidates
            .iter()
            .map(|(_, batch)| batch.quantity_of(&line.color))
            .sum();

        let mut plan = AllocationPlan::default();
        let mut updates: Vec<(BatchId, Vec<BatchItem>)> = Vec::new();
        let mut remaining = line.quantity;

        for (batch_id, batch) in candidates {
            if remaining <= 0.0 {
                break;
            }
            let in_batch = batch.quantity_of(&line.color);
            if in_batch <= 0.0 {
                continue;
            }

            if !self.locks.acquire(batch_id.as_str()).await {
                // Locks acquired earlier in this walk are released by the
                // caller; the walk halts at the first denial.
                return Err(InventoryError::BatchLocked {
                    batch_id: batch_id.clone(),
                });
            }
            locked.push(batch_id.clone());

            let take = in_batch.min(remaining);
            plan.takes.push(BatchTake {
                batch_id: batch_id.clone(),
                quantity_taken: take,
            });
            updates.push((batch_id.clone(), batch.reduce_color(&line.color, take)));
            remaining -= take;
        }

        if remaining > 0.0 {
            return Err(InventoryError::InsufficientStock {
                fabric_id: line.fabric_id,
                color: line.color.clone(),
                requested: line.quantity,
                available,
            });
        }

        // Persist only once the whole line is satisfied.
        for (batch_id, items) in updates {
            let batch_path = format!("{fabric_path}/batches/{batch_id}");
            self.store
                .update(&batch_path, json!({ "items": serde_json::to_value(items)? }))
                .await?;
        }

        tracing::info!(
            fabric_id = %line.fabric_id,
            color = %line.color,
            quantity = line.quantity,
            batches = plan.takes.len(),
            "inventory reduced"
        );
        Ok(plan)
    }

    async fn release_all(&self, locked: &[BatchId]) {
        for batch_id in locked {
            self.locks.release(batch_id.as_str()).await;
        }
    }
}
