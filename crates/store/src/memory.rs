use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError, ValueSnapshot,
    store::{Store, validate_path},
};

#[derive(Debug)]
struct StoreInner {
    root: Value,
    push_counter: u64,
    offline: bool,
    fail_on_write: bool,
    denied_paths: HashSet<String>,
}

impl Default for StoreInner {
    fn default() -> Self {
        Self {
            root: Value::Object(Map::new()),
            push_counter: 0,
            offline: false,
            fail_on_write: false,
            denied_paths: HashSet::new(),
        }
    }
}

/// In-memory store implementation for testing.
///
/// Holds the whole tree as a single JSON object and provides the same
/// interface a remote hierarchical store would, plus hooks to inject
/// connectivity, permission, and write failures.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates loss (or restoration) of connectivity to the store.
    pub async fn set_offline(&self, offline: bool) {
        self.inner.write().await.offline = offline;
    }

    /// Configures every write call to fail with an unavailability error.
    pub async fn set_fail_on_write(&self, fail: bool) {
        self.inner.write().await.fail_on_write = fail;
    }

    /// Denies all access to a path and everything beneath it.
    pub async fn deny(&self, path: impl Into<String>) {
        self.inner.write().await.denied_paths.insert(path.into());
    }

    /// Clears all values and injected failures.
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        *inner = StoreInner::default();
    }
}

fn check_path(path: &str) -> Result<()> {
    validate_path(path).map_err(|e| StoreError::InvalidPath(e.message))
}

fn check_access(inner: &StoreInner, path: &str) -> Result<()> {
    if inner.offline {
        return Err(StoreError::Unavailable(format!(
            "connection to store lost while accessing {path}"
        )));
    }
    for denied in &inner.denied_paths {
        if path == denied.as_str() || path.starts_with(&format!("{denied}/")) {
            return Err(StoreError::PermissionDenied(path.to_string()));
        }
    }
    Ok(())
}

fn check_write(inner: &StoreInner, path: &str) -> Result<()> {
    check_access(inner, path)?;
    if inner.fail_on_write {
        return Err(StoreError::Unavailable(format!(
            "write to {path} failed: store unavailable"
        )));
    }
    Ok(())
}

fn resolve<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('/') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Walks to the parent of the final segment, creating intermediate objects.
fn resolve_entry<'a>(root: &'a mut Value, path: &str) -> (&'a mut Map<String, Value>, String) {
    let mut segments: Vec<&str> = path.split('/').collect();
    let last = segments.pop().expect("validated path has segments");

    let mut current = root;
    for segment in segments {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        current = current
            .as_object_mut()
            .expect("just ensured object")
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    if !current.is_object() {
        *current = Value::Object(Map::new());
    }
    (
        current.as_object_mut().expect("just ensured object"),
        last.to_string(),
    )
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get(&self, path: &str) -> Result<ValueSnapshot> {
        check_path(path)?;
        let inner = self.inner.read().await;
        check_access(&inner, path)?;

        let value = resolve(&inner.root, path).cloned();
        Ok(ValueSnapshot::new(path, value))
    }

    async fn set(&self, path: &str, value: Value) -> Result<()> {
        check_path(path)?;
        let mut inner = self.inner.write().await;
        check_write(&inner, path)?;

        let (parent, key) = resolve_entry(&mut inner.root, path);
        parent.insert(key, value);
        Ok(())
    }

    async fn update(&self, path: &str, patch: Value) -> Result<()> {
        check_path(path)?;
        let mut inner = self.inner.write().await;
        check_write(&inner, path)?;

        let (parent, key) = resolve_entry(&mut inner.root, path);
        match (parent.get_mut(&key), patch) {
            (Some(Value::Object(existing)), Value::Object(fields)) => {
                for (field, value) in fields {
                    existing.insert(field, value);
                }
            }
            (_, patch) => {
                parent.insert(key, patch);
            }
        }
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<()> {
        check_path(path)?;
        let mut inner = self.inner.write().await;
        check_write(&inner, path)?;

        let (parent, key) = resolve_entry(&mut inner.root, path);
        parent.remove(&key);
        Ok(())
    }

    async fn push(&self, path: &str) -> Result<String> {
        check_path(path)?;
        let mut inner = self.inner.write().await;
        check_write(&inner, path)?;

        // Zero-padded so lexicographic key order is creation order.
        inner.push_counter += 1;
        Ok(format!("k{:08}", inner.push_counter))
    }
}
