//! Fabric and batch records as stored under `fabrics/<id>`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::Money;
use serde::{Deserialize, Serialize};

use crate::value_objects::BatchId;

/// Per-color stock within a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    /// Color name as shown on the sales floor.
    pub color_name: String,
    /// Stock on hand, in the fabric's unit. Never negative.
    pub quantity: f64,
    /// Optional hex color code for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_code: Option<String>,
}

impl BatchItem {
    /// Creates an item with a color and quantity.
    pub fn new(color_name: impl Into<String>, quantity: f64) -> Self {
        Self {
            color_name: color_name.into(),
            quantity,
            color_code: None,
        }
    }
}

/// A purchase batch of a fabric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    /// Per-color stock in this batch.
    pub items: Vec<BatchItem>,
    /// When the batch was purchased; drives FIFO consumption order.
    pub purchase_date: DateTime<Utc>,
    /// Cost per unit at purchase time.
    pub unit_cost: Money,
    /// Supplier name.
    pub supplier: String,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl Batch {
    /// Total stock of a color in this batch.
    pub fn quantity_of(&self, color: &str) -> f64 {
        self.items
            .iter()
            .filter(|item| item.color_name == color)
            .map(|item| item.quantity)
            .sum()
    }

    /// Returns true if this batch carries the color at all, even at zero
    /// quantity.
    pub fn has_color(&self, color: &str) -> bool {
        self.items.iter().any(|item| item.color_name == color)
    }

    /// Returns true if every item in the batch is at zero quantity.
    pub fn is_depleted(&self) -> bool {
        self.items.iter().all(|item| item.quantity <= 0.0)
    }

    /// Returns the items with `amount` subtracted from the color's stock,
    /// consuming matching items in order and clamping each at zero.
    pub fn reduce_color(&self, color: &str, mut amount: f64) -> Vec<BatchItem> {
        self.items
            .iter()
            .map(|item| {
                let mut item = item.clone();
                if item.color_name == color && amount > 0.0 {
                    let take = item.quantity.min(amount);
                    item.quantity -= take;
                    amount -= take;
                }
                item
            })
            .collect()
    }
}

/// A fabric and the batches it owns.
///
/// Batches are keyed by their store key; the map therefore iterates in
/// creation order, which is what breaks purchase-date ties during FIFO
/// selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fabric {
    /// Display name.
    pub name: String,
    /// Category (e.g. "Natural", "Synthetic").
    pub category: String,
    /// Sales unit (e.g. "m", "yd").
    pub unit: String,
    /// Batches by store key.
    #[serde(default)]
    pub batches: BTreeMap<BatchId, Batch>,
}

impl Fabric {
    /// Total stock of a color across all batches.
    pub fn total_quantity(&self, color: &str) -> f64 {
        self.batches
            .values()
            .map(|batch| batch.quantity_of(color))
            .sum()
    }

    /// Batches carrying the color, oldest purchase first.
    ///
    /// The sort is stable, so batches purchased the same day keep their
    /// creation order.
    pub fn fifo_candidates(&self, color: &str) -> Vec<(&BatchId, &Batch)> {
        let mut candidates: Vec<_> = self
            .batches
            .iter()
            .filter(|(_, batch)| batch.has_color(color))
            .collect();
        candidates.sort_by_key(|(_, batch)| batch.purchase_date);
        candidates
    }
}
