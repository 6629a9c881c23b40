//! Fabric inventory domain and FIFO stock reduction.
//!
//! A fabric owns batches keyed by creation-ordered store keys; each batch
//! holds per-color quantities. Selling reduces stock oldest-purchase-first
//! across batches, coordinating a lock per touched batch so concurrent
//! sales never drive a quantity negative. Reduction either fully satisfies
//! every sale line it reaches or persists nothing for the failing line, and
//! every lock it acquires is released before it returns.

pub mod allocator;
pub mod error;
pub mod fabric;
pub mod sale;
pub mod value_objects;

pub use allocator::InventoryAllocator;
pub use error::{InventoryError, Result};
pub use fabric::{Batch, BatchItem, Fabric};
pub use sale::{AllocationPlan, BatchTake, SaleLine};
pub use value_objects::{BatchId, FabricId};
