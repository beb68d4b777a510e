//! Mock snapshot store for unit testing.
//!
//! Wraps a [`MemoryStore`] and lets tests inject failures, latency and
//! keys that vanish between listing and fetching.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use super::{MemoryStore, SnapshotStore};
use crate::error::StoreError;

/// Configuration for mock store behavior.
#[derive(Debug, Clone, Default)]
pub struct MockStoreConfig {
    /// Whether to fail get requests.
    pub fail_get: bool,
    /// Whether to fail list requests.
    pub fail_list: bool,
    /// Whether to fail put requests.
    pub fail_put: bool,
    /// Simulated latency in milliseconds.
    pub latency_ms: u64,
}

impl MockStoreConfig {
    /// Every operation fails.
    pub fn failing() -> Self {
        Self {
            fail_get: true,
            fail_list: true,
            fail_put: true,
            latency_ms: 0,
        }
    }
}

/// Mock store for testing.
#[derive(Debug, Clone, Default)]
pub struct MockStore {
    config: MockStoreConfig,
    inner: MemoryStore,
    /// Keys reported by `list` that have no value behind them.
    phantom_keys: Arc<Mutex<Vec<String>>>,
}

impl MockStore {
    /// Create a new mock store with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock store with custom configuration.
    pub fn with_config(config: MockStoreConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Seed a value without going through fault injection.
    pub async fn seed(&self, key: &str, value: Value) {
        // MemoryStore::put never fails
        let _ = self.inner.put(key, value).await;
    }

    /// Make `list` report a key that no longer has a value.
    pub fn add_phantom_key(&self, key: &str) {
        self.phantom_keys
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(key.to_string());
    }

    async fn simulate(&self, fail: bool, op: &str) -> Result<(), StoreError> {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.config.latency_ms)).await;
        }

        if fail {
            return Err(StoreError::Unavailable(format!("mock {} failure", op)));
        }

        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for MockStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.simulate(self.config.fail_get, "get").await?;
        self.inner.get(key).await
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        self.simulate(self.config.fail_list, "list").await?;

        let mut keys = self.inner.list().await?;
        let phantoms = self
            .phantom_keys
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        keys.extend(phantoms);
        keys.sort();
        Ok(keys)
    }

    async fn put(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.simulate(self.config.fail_put, "put").await?;
        self.inner.put(key, value).await
    }
}
