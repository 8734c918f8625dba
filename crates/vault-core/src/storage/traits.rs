//! Storage trait definitions

use crate::error::Result;
use async_trait::async_trait;

/// Local persistent key-value store
///
/// Every `set` replaces the whole value for a key; readers never observe a
/// partially written value.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Retrieve a value by key
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value, overwriting any previous value
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value by key. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a key exists
    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Get a human-readable name for this storage backend
    fn backend_name(&self) -> &'static str;
}
