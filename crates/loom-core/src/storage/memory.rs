//! In-memory key-value storage
//!
//! Nothing survives the process. Used for ephemeral sessions and by tests,
//! which can also make writes fail on demand.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::error::{StorageError, StorageResult};
use super::KeyValueStorage;

/// Process-local key-value storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<String, String>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create storage pre-populated with one slot
    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut slots = HashMap::new();
        slots.insert(key.into(), value.into());
        Self {
            slots: Mutex::new(slots),
            ..Self::default()
        }
    }

    /// Number of successful writes so far
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every following `set` fail (or succeed again)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.slots.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable {
                key: key.to_string(),
                details: "writes are disabled".to_string(),
            });
        }

        self.slots
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_and_count() {
        let storage = MemoryStorage::new();
        assert!(storage.get("k").await.unwrap().is_none());

        storage.set("k", "v").await.unwrap();
        assert_eq!(storage.get("k").await.unwrap().as_deref(), Some("v"));
        assert_eq!(storage.writes(), 1);
    }

    #[tokio::test]
    async fn test_failing_writes_leave_value() {
        let storage = MemoryStorage::with_value("k", "old");
        storage.set_fail_writes(true);

        let err = storage.set("k", "new").await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable { .. }));
        assert_eq!(storage.get("k").await.unwrap().as_deref(), Some("old"));
        assert_eq!(storage.writes(), 0);
    }
}
