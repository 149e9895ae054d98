//! In-memory storage backend.
//!
//! Thread-safe reference implementation of [`StorageHandler`], intended
//! for embedded hosts, tests, and as a template for real backends.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::storage::traits::{StorageError, StorageHandler};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::backend(format!("poisoned lock: {context}"))
}

/// Thread-safe in-memory byte store keyed by name.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    ///
    /// # Errors
    /// Returns a backend error if the lock is poisoned.
    pub fn key_count(&self) -> Result<usize, StorageError> {
        Ok(self
            .entries
            .read()
            .map_err(|_| lock_err("memory.key_count"))?
            .len())
    }

    /// Removes every stored key.
    ///
    /// # Errors
    /// Returns a backend error if the lock is poisoned.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.entries
            .write()
            .map_err(|_| lock_err("memory.clear"))?
            .clear();
        Ok(())
    }
}

#[async_trait]
impl StorageHandler for MemoryStorage {
    async fn write(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| lock_err("memory.write"))?;
        entries.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let entries = self.entries.read().map_err(|_| lock_err("memory.read"))?;
        entries
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::not_found(key))
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| lock_err("memory.exists"))?;
        Ok(entries.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_read_round_trip() {
        let storage = MemoryStorage::new();
        storage.write("save0.sav", b"payload").await.unwrap();
        assert_eq!(storage.read("save0.sav").await.unwrap(), b"payload");
    }

    #[tokio::test]
    async fn write_replaces_previous_value() {
        let storage = MemoryStorage::new();
        storage.write("k", b"first").await.unwrap();
        storage.write("k", b"second").await.unwrap();
        assert_eq!(storage.read("k").await.unwrap(), b"second");
        assert_eq!(storage.key_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn missing_key_is_not_found_on_read_and_false_on_exists() {
        let storage = MemoryStorage::new();
        assert!(matches!(
            storage.read("missing").await,
            Err(StorageError::NotFound { .. })
        ));
        assert!(!storage.exists("missing").await.unwrap());
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let storage = MemoryStorage::new();
        storage.write("a", b"1").await.unwrap();
        storage.write("b", b"2").await.unwrap();
        storage.clear().unwrap();
        assert_eq!(storage.key_count().unwrap(), 0);
        assert!(!storage.exists("a").await.unwrap());
    }
}
