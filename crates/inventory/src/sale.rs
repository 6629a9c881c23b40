//! Sale line requests and allocation plans.

use serde::Serialize;

use crate::error::{InventoryError, Result};
use crate::value_objects::{BatchId, FabricId};

/// A request to reduce stock of one color of one fabric.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleLine {
    /// The fabric being sold.
    pub fabric_id: FabricId,
    /// The color being sold.
    pub color: String,
    /// Quantity requested; must be positive.
    pub quantity: f64,
}

impl SaleLine {
    /// Creates a sale line.
    pub fn new(fabric_id: FabricId, color: impl Into<String>, quantity: f64) -> Self {
        Self {
            fabric_id,
            color: color.into(),
            quantity,
        }
    }

    /// Rejects non-positive (or NaN) quantities before any store access.
    pub fn validate(&self) -> Result<()> {
        if !(self.quantity > 0.0) {
            return Err(InventoryError::InvalidQuantity {
                color: self.color.clone(),
                quantity: self.quantity,
            });
        }
        Ok(())
    }
}

/// One batch's share of an allocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchTake {
    /// The batch stock is taken from.
    pub batch_id: BatchId,
    /// How much is taken from it.
    pub quantity_taken: f64,
}

/// The per-batch breakdown of a satisfied sale line, in consumption order.
///
/// A persisted plan's takes always sum to exactly the requested quantity;
/// a plan is never persisted otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AllocationPlan {
    /// Takes in FIFO order.
    pub takes: Vec<BatchTake>,
}

impl AllocationPlan {
    /// Sum of quantities across all takes.
    pub fn total_taken(&self) -> f64 {
        self.takes.iter().map(|take| take.quantity_taken).sum()
    }

    /// Returns true if no stock was allocated.
    pub fn is_empty(&self) -> bool {
        self.takes.is_empty()
    }
}
