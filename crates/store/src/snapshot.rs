use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{Result, StoreError};

/// The result of reading a path from the store.
///
/// A snapshot is returned for every read, whether or not a value exists at
/// the path. Callers check [`exists`](ValueSnapshot::exists) or use
/// [`val`](ValueSnapshot::val) to fail on a missing value.
#[derive(Debug, Clone)]
pub struct ValueSnapshot {
    path: String,
    value: Option<Value>,
}

impl ValueSnapshot {
    /// Creates a snapshot for a path and the value found there, if any.
    pub fn new(path: impl Into<String>, value: Option<Value>) -> Self {
        Self {
            path: path.into(),
            value,
        }
    }

    /// The path this snapshot was read from.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns true if a value exists at the path.
    pub fn exists(&self) -> bool {
        self.value.is_some()
    }

    /// Returns the value, or `PathNotFound` if nothing exists at the path.
    pub fn val(&self) -> Result<&Value> {
        self.value
            .as_ref()
            .ok_or_else(|| StoreError::PathNotFound(self.path.clone()))
    }

    /// Deserializes the value into a typed record.
    pub fn to<T: DeserializeOwned>(&self) -> Result<T> {
        let value = self.val()?;
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Consumes the snapshot, returning the raw value if present.
    pub fn into_value(self) -> Option<Value> {
        self.value
    }
}
