use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::Error;
use crate::error::Result;
use crate::storage::KvStorageInterface;

/// In-memory store on a concurrent hash map, optionally bounded in entries.
#[derive(Debug, Default)]
pub struct MemStorage<V>
where V: Clone
{
    table: DashMap<Vec<u8>, V>,
    capacity: Option<usize>,
}

impl<V> MemStorage<V>
where V: Clone
{
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            table: DashMap::default(),
            capacity: None,
        }
    }

    /// Create an empty store that refuses new keys once it holds `capacity` entries.
    /// Overwriting a key already stored is always allowed.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: DashMap::default(),
            capacity: Some(capacity),
        }
    }
}

#[async_trait]
impl<V> KvStorageInterface<V> for MemStorage<V>
where V: Clone + Send + Sync
{
    async fn get(&self, key: &[u8]) -> Result<Option<V>> {
        Ok(self.table.get(key).map(|v| v.value().clone()))
    }

    async fn put(&self, key: &[u8], value: &V) -> Result<()> {
        if let Some(capacity) = self.capacity {
            if !self.table.contains_key(key) && self.table.len() >= capacity {
                return Err(Error::Storage(format!(
                    "store is full, capacity {} entries",
                    capacity
                )));
            }
        }
        self.table.insert(key.to_vec(), value.clone());
        Ok(())
    }

    async fn remove(&self, key: &[u8]) -> Result<()> {
        self.table.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.table.clear();
        Ok(())
    }

    async fn count(&self) -> Result<u32> {
        u32::try_from(self.table.len())
            .map_err(|_| Error::Storage(format!("{} entries overflow the count", self.table.len())))
    }
}
