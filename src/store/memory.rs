//! In-process snapshot store.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use super::SnapshotStore;
use crate::error::StoreError;

/// Map-backed store; keys list in lexicographic order like Workers KV.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<BTreeMap<String, Value>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the store holds no keys.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }

    async fn put(&self, key: &str, value: Value) -> Result<(), StoreError> {
        debug!(key, "Storing snapshot in memory");
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }
}
