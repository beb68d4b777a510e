//! Key-value store backends holding monitor snapshots.
//!
//! This module handles:
//! - The `SnapshotStore` trait the API is written against
//! - An in-process store for local development
//! - A Cloudflare Workers KV client
//! - A fault-injecting mock for testing

pub mod cloudflare;
pub mod memory;
pub mod mock;

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::{Config, StoreBackend};
use crate::error::StoreError;
use crate::metrics;

pub use cloudflare::CloudflareKvStore;
pub use memory::MemoryStore;
pub use mock::{MockStore, MockStoreConfig};

/// Async key-value store of JSON values.
#[async_trait]
pub trait SnapshotStore: Send + Sync + Debug {
    /// Fetch the value at `key`, `None` when nothing is stored.
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    /// Every key currently in the store, in the store's listing order.
    async fn list(&self) -> Result<Vec<String>, StoreError>;

    /// Replace whatever is stored at `key` with `value`.
    async fn put(&self, key: &str, value: Value) -> Result<(), StoreError>;
}

/// Store handle shared by all request handlers.
pub type SharedStore = Arc<dyn SnapshotStore>;

/// Build the configured store backend.
pub fn from_config(config: &Config) -> crate::Result<SharedStore> {
    match config.store_backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreBackend::Cloudflare => Ok(Arc::new(CloudflareKvStore::from_config(config)?)),
    }
}

/// Run one store operation, recording its latency and counting failures.
pub(crate) async fn observe<T, F>(op: &'static str, fut: F) -> Result<T, StoreError>
where
    F: std::future::Future<Output = Result<T, StoreError>>,
{
    let start = Instant::now();
    let result = fut.await;
    metrics::record_store_latency(start, op);
    if result.is_err() {
        metrics::inc_store_failures(op);
    }
    result
}
