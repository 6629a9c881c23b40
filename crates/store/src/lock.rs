use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

/// Trait for mutual exclusion over named resources.
///
/// Acquisition is a boolean: a denial is immediate and final for that
/// attempt, there is no waiting or timeout. Release is idempotent and
/// releasing an unheld lock must not fail; callers release every lock they
/// acquired on every exit path, including paths where they are no longer
/// sure which acquisitions succeeded.
#[async_trait]
pub trait LockService: Send + Sync {
    /// Attempts to acquire the lock for a resource.
    ///
    /// Returns true if the lock was acquired.
    async fn acquire(&self, resource: &str) -> bool;

    /// Releases the lock for a resource. Idempotent.
    async fn release(&self, resource: &str);
}

#[derive(Debug, Default)]
struct InMemoryLockState {
    held: HashSet<String>,
    denied: HashSet<String>,
    acquire_calls: u32,
    release_calls: u32,
}

/// In-memory lock service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLockService {
    state: Arc<RwLock<InMemoryLockState>>,
}

impl InMemoryLockService {
    /// Creates a new in-memory lock service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the service to deny every acquire call for a resource.
    pub fn deny(&self, resource: impl Into<String>) {
        self.state.write().unwrap().denied.insert(resource.into());
    }

    /// Returns true if the lock for a resource is currently held.
    pub fn is_held(&self, resource: &str) -> bool {
        self.state.read().unwrap().held.contains(resource)
    }

    /// Returns the number of locks currently held.
    pub fn held_count(&self) -> usize {
        self.state.read().unwrap().held.len()
    }

    /// Returns the number of acquire calls made so far.
    pub fn acquire_calls(&self) -> u32 {
        self.state.read().unwrap().acquire_calls
    }

    /// Returns the number of release calls made so far.
    pub fn release_calls(&self) -> u32 {
        self.state.read().unwrap().release_calls
    }
}

#[async_trait]
impl LockService for InMemoryLockService {
    async fn acquire(&self, resource: &str) -> bool {
        let mut state = self.state.write().unwrap();
        state.acquire_calls += 1;

        if state.denied.contains(resource) {
            return false;
        }
        state.held.insert(resource.to_string())
    }

    async fn release(&self, resource: &str) {
        let mut state = self.state.write().unwrap();
        state.release_calls += 1;
        state.held.remove(resource);
    }
}
