//! Value objects for the inventory domain.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a fabric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FabricId(Uuid);

impl FabricId {
    /// Creates a new random fabric ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a fabric ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for FabricId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FabricId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for FabricId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<FabricId> for Uuid {
    fn from(id: FabricId) -> Self {
        id.0
    }
}

/// Batch identifier: the batch's key under its fabric in the store.
///
/// Keys are assigned by the store at purchase time and are ordered by
/// creation, so sorting keys sorts batches by insertion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(String);

impl BatchId {
    /// Creates a batch ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the batch ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for BatchId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for BatchId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for BatchId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
