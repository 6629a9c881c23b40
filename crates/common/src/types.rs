use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a tracked operation.
///
/// Wraps a UUID to provide type safety and prevent mixing up
/// operation IDs with other UUID-based identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(Uuid);

impl OperationId {
    /// Creates a new random operation ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an operation ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for OperationId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<OperationId> for Uuid {
    fn from(id: OperationId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_id_new_creates_unique_ids() {
        let id1 = OperationId::new();
        let id2 = OperationId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn operation_id_from_uuid_preserves_value() {
        let uuid = Uuid::new_v4();
        let id = OperationId::from_uuid(uuid);
        assert_eq!(id.as_uuid(), uuid);
    }

    #[test]
    fn operation_id_serialization_roundtrip() {
        let id = OperationId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: OperationId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
