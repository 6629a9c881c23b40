use async_trait::async_trait;
use serde_json::Value;

use crate::{Result, ValueSnapshot};

/// Core trait for hierarchical store implementations.
///
/// Paths are slash-separated (`"fabrics/<id>/batches/<batch-id>"`) and values
/// are JSON. All implementations must be thread-safe (Send + Sync). Any call
/// may fail with an unavailability, permission, or conflict error; callers
/// are expected to classify and retry at a higher layer.
#[async_trait]
pub trait Store: Send + Sync {
    /// Reads the value at a path.
    ///
    /// Returns a snapshot whether or not a value exists there.
    async fn get(&self, path: &str) -> Result<ValueSnapshot>;

    /// Writes a value at a path, replacing whatever was there.
    async fn set(&self, path: &str, value: Value) -> Result<()>;

    /// Merges the fields of a JSON object into the value at a path.
    ///
    /// Top-level fields of `patch` overwrite the corresponding fields of the
    /// existing object; other fields are left untouched. Patching a path
    /// that holds no object behaves like [`set`](Store::set).
    async fn update(&self, path: &str, patch: Value) -> Result<()>;

    /// Removes the value at a path. Removing a missing path is a no-op.
    async fn remove(&self, path: &str) -> Result<()>;

    /// Reserves a new child key under a path and returns it.
    ///
    /// Keys are unique and ordered: iterating children by key visits them
    /// in creation order.
    async fn push(&self, path: &str) -> Result<String>;
}

/// Error returned for a malformed store path.
#[derive(Debug, Clone)]
pub struct PathValidationError {
    pub message: String,
}

impl std::fmt::Display for PathValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Path validation error: {}", self.message)
    }
}

impl std::error::Error for PathValidationError {}

/// Validates a path before a store call.
pub fn validate_path(path: &str) -> std::result::Result<(), PathValidationError> {
    if path.is_empty() {
        return Err(PathValidationError {
            message: "Path must not be empty".to_string(),
        });
    }

    if path.starts_with('/') || path.ends_with('/') {
        return Err(PathValidationError {
            message: format!("Path must not start or end with '/': {path}"),
        });
    }

    for segment in path.split('/') {
        if segment.is_empty() {
            return Err(PathValidationError {
                message: format!("Path contains an empty segment: {path}"),
            });
        }
    }

    Ok(())
}
