//! Module of the key value store collaborator.

pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
pub use crate::storage::memory::MemStorage;

/// Key value storage interface, byte keyed.
#[async_trait]
pub trait KvStorageInterface<V> {
    /// Get a cache entry by `key`.
    async fn get(&self, key: &[u8]) -> Result<Option<V>>;

    /// Put `entry` in the cache under `key`.
    async fn put(&self, key: &[u8], value: &V) -> Result<()>;

    /// Remove an `entry` by `key`.
    async fn remove(&self, key: &[u8]) -> Result<()>;

    /// Delete all values.
    async fn clear(&self) -> Result<()>;

    /// Get the current storage usage.
    async fn count(&self) -> Result<u32>;
}

/// Store of raw values held by a ring node.
pub type SharedStorage = Arc<dyn KvStorageInterface<Vec<u8>> + Send + Sync>;
