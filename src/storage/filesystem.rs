//! Filesystem storage backend.
//!
//! Maps storage keys to files under a fixed root directory using
//! `tokio::fs`. Keys must be bare file names; anything that looks like a
//! path escape is rejected before touching the filesystem.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::storage::traits::{StorageError, StorageHandler};

/// Directory-rooted filesystem backend.
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    /// Creates a backend rooted at `root`. The directory is created on
    /// first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory keys are resolved under.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty() {
            return Err(StorageError::backend("empty storage key"));
        }
        if key.contains('/') || key.contains('\\') || key.contains("..") {
            return Err(StorageError::backend(format!(
                "storage key '{key}' must be a bare file name"
            )));
        }
        Ok(self.root.join(key))
    }
}

fn io_err(context: &str, err: &std::io::Error) -> StorageError {
    StorageError::backend(format!("{context}: {err}"))
}

#[async_trait]
impl StorageHandler for FsStorage {
    async fn write(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.resolve(key)?;
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| io_err("create storage root", &e))?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| io_err("write file", &e))
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::not_found(key)),
            Err(e) => Err(io_err("read file", &e)),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.resolve(key)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| io_err("check file existence", &e))
    }
}
