//! Storage layer
//!
//! Durable key-value slots holding serialized collections.
//!
//! ## Backends
//!
//! - **FileStorage**: one file per key in the data directory, atomic writes
//! - **MemoryStorage**: process-local map for ephemeral sessions and tests
//!
//! Values are opaque strings; the collection layer decides their format.

pub mod error;
pub mod file;
pub mod memory;

use async_trait::async_trait;

pub use error::{StorageError, StorageResult};
pub use file::FileStorage;
pub use memory::MemoryStorage;

/// A durable string slot per key
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `key`, `None` if the slot was never written
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Replace the value stored under `key`
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Copy the value under `from` to `to` as stored
    ///
    /// Returns `false` when `from` holds nothing. Backends that can read
    /// undecodable values should copy them byte for byte.
    async fn copy(&self, from: &str, to: &str) -> StorageResult<bool> {
        match self.get(from).await? {
            Some(value) => {
                self.set(to, &value).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
