//! Abstract storage handler trait.
//!
//! All three operations are asynchronous with single-shot completion.
//! A returned error signals a handler-level failure independent of the
//! semantic result: `exists` returning `Ok(false)` is a normal
//! "not found", whereas `Err(_)` means the check itself could not be
//! performed.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The key does not exist in the backend.
    #[error("key not found: {key}")]
    NotFound {
        /// The missing storage key.
        key: String,
    },

    /// The backend itself failed.
    #[error("storage backend error: {message}")]
    Backend {
        /// Backend-specific failure description.
        message: String,
    },
}

impl StorageError {
    /// Creates a backend error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Creates a not-found error for `key`.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }
}

/// Asynchronous byte-oriented storage backend.
///
/// Keys are opaque names from the engine's naming policy; the handler
/// owns the mapping to physical storage. The engine's exclusion gates
/// keep save and config document keys free of concurrent operations;
/// header keys are exempt, since header reads are unguarded and may
/// overlap an in-flight save's header write. Backends must tolerate a
/// read racing a write on the same key (last write wins is fine).
#[async_trait]
pub trait StorageHandler: Send + Sync {
    /// Persists `bytes` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the write could not be performed.
    async fn write(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Reads the bytes stored under `key`.
    ///
    /// # Errors
    /// Returns [`StorageError::NotFound`] when the key is absent, or a
    /// backend error if the read could not be performed.
    async fn read(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Reports whether `key` exists.
    ///
    /// # Errors
    /// Returns a [`StorageError`] only when the check itself failed;
    /// an absent key is `Ok(false)`.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time test: the handler is usable as a trait object.
    fn _assert_object_safe(_: &dyn StorageHandler) {}

    #[test]
    fn error_display() {
        let err = StorageError::not_found("save0.sav");
        assert!(err.to_string().contains("save0.sav"));

        let err = StorageError::backend("disk full");
        assert!(err.to_string().contains("disk full"));
    }
}
