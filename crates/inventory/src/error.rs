//! Inventory error types.

use atomic_ops::OpError;
use serde_json::Value;
use store::StoreError;
use thiserror::Error;

use crate::value_objects::{BatchId, FabricId};

/// Errors that can occur during inventory operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Total stock of the color across all batches is less than requested.
    /// Deterministic and never retryable.
    #[error(
        "Insufficient stock of {color} for fabric {fabric_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        fabric_id: FabricId,
        color: String,
        requested: f64,
        available: f64,
    },

    /// Another sale holds the lock for a batch this line needs.
    #[error("Could not acquire lock for batch {batch_id}")]
    BatchLocked { batch_id: BatchId },

    /// The fabric record does not exist.
    #[error("Fabric not found: {0}")]
    FabricNotFound(FabricId),

    /// The requested quantity is not positive.
    #[error("Invalid quantity {quantity} requested for color {color}")]
    InvalidQuantity { color: String, quantity: f64 },

    /// A store call failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A fabric record could not be deserialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for inventory operations.
pub type Result<T> = std::result::Result<T, InventoryError>;

impl From<InventoryError> for OpError {
    fn from(e: InventoryError) -> Self {
        let message = e.to_string();
        match e {
            InventoryError::BatchLocked { batch_id } => OpError::conflict(message)
                .context("batch_id", Value::String(batch_id.as_str().to_string())),
            InventoryError::InsufficientStock {
                fabric_id,
                color,
                requested,
                available,
            } => OpError::validation(message)
                .context("fabric_id", Value::String(fabric_id.to_string()))
                .context("color", Value::String(color))
                .context("requested", requested.into())
                .context("available", available.into()),
            InventoryError::FabricNotFound(fabric_id) => OpError::not_found(message)
                .context("fabric_id", Value::String(fabric_id.to_string())),
            InventoryError::InvalidQuantity { color, .. } => {
                OpError::validation(message).context("color", Value::String(color))
            }
            InventoryError::Store(store_error) => store_error.into(),
            InventoryError::Serialization(_) => OpError::validation(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atomic_ops::ErrorKind;

    #[test]
    fn lock_denial_converts_to_conflict_with_batch_context() {
        let error: OpError = InventoryError::BatchLocked {
            batch_id: BatchId::new("k42"),
        }
        .into();

        assert_eq!(error.kind(), Some(ErrorKind::Conflict));
        assert!(error.message().contains("lock"));
        assert_eq!(error.context_entries()["batch_id"], "k42");
    }

    #[test]
    fn insufficient_stock_converts_to_validation() {
        let error: OpError = InventoryError::InsufficientStock {
            fabric_id: FabricId::new(),
            color: "Black".to_string(),
            requested: 20.0,
            available: 10.0,
        }
        .into();

        assert_eq!(error.kind(), Some(ErrorKind::Validation));
        assert!(error.message().contains("Insufficient stock"));
        assert!(!error.kind().unwrap().is_retryable());
    }

    #[test]
    fn missing_fabric_converts_to_not_found() {
        let error: OpError = InventoryError::FabricNotFound(FabricId::new()).into();
        assert_eq!(error.kind(), Some(ErrorKind::NotFound));
    }
}
