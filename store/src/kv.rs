//! Key-value store trait.

use async_trait::async_trait;

use crate::StoreError;

/// A remote string key-value store with get/set/delete semantics.
///
/// No TTLs are used: entries stay until overwritten or deleted, which is what
/// lets stale snapshots serve as an error-path fallback. Concurrent writers to
/// the same key resolve last-write-wins.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a value; `Ok(None)` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
