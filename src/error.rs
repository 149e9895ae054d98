//! Error types for the save engine.
//!
//! Every public operation completes through its returned `Result`; the
//! engine never panics across its boundary. Errors are strongly typed
//! with thiserror so hosts can pattern match on specific conditions.

use std::fmt;

use thiserror::Error;

use crate::codec::CodecError;
use crate::storage::StorageError;

/// The two independent mutual-exclusion categories.
///
/// Save and load of the same category exclude each other; data and config
/// operations may overlap freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCategory {
    /// Save-document operations.
    Data,
    /// Config-document operations.
    Config,
}

impl fmt::Display for OpCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Data => write!(f, "data"),
            Self::Config => write!(f, "config"),
        }
    }
}

/// Top-level error type for engine operations.
#[derive(Debug, Error)]
pub enum SaveError {
    /// A live engine already exists in this process.
    #[error("a save engine is already initialized in this process")]
    AlreadyInitialized,

    /// A conflicting operation of the same category is in flight.
    #[error("another {category} save/load operation is already in progress")]
    OperationInProgress {
        /// The contended category.
        category: OpCategory,
    },

    /// No current save document has been set.
    #[error("no current save data set; call set_current_save_data first")]
    NoCurrentSaveData,

    /// No current config document has been set.
    #[error("no current config data set; call set_current_config_data first")]
    NoCurrentConfigData,

    /// The requested save slot has no stored document.
    #[error("save slot {slot} does not exist")]
    SlotNotFound {
        /// The probed slot index.
        slot: u32,
    },

    /// The requested save slot has no stored header.
    #[error("no save header recorded for slot {slot}")]
    HeaderNotFound {
        /// The probed slot index.
        slot: u32,
    },

    /// No config document has been persisted yet.
    #[error("config file does not exist")]
    ConfigNotFound,

    /// The storage handler reported a failure.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Encoding or decoding a document failed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

impl SaveError {
    /// True if the operation was refused because a conflicting operation
    /// was in flight. Not retried automatically; retry after the in-flight
    /// operation completes.
    #[must_use]
    pub const fn is_reentrancy(&self) -> bool {
        matches!(self, Self::OperationInProgress { .. })
    }

    /// True if a precondition was violated (no current document set, or a
    /// second engine construction attempt).
    #[must_use]
    pub const fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::AlreadyInitialized | Self::NoCurrentSaveData | Self::NoCurrentConfigData
        )
    }

    /// True if the target save/header/config simply was not there — a
    /// normal outcome the host is expected to handle.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::SlotNotFound { .. } | Self::HeaderNotFound { .. } | Self::ConfigNotFound
        )
    }
}

/// Result type alias for engine operations.
pub type SaveResult<T> = Result<T, SaveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_display() {
        assert_eq!(OpCategory::Data.to_string(), "data");
        assert_eq!(OpCategory::Config.to_string(), "config");
    }

    #[test]
    fn reentrancy_classification() {
        let err = SaveError::OperationInProgress {
            category: OpCategory::Data,
        };
        assert!(err.is_reentrancy());
        assert!(!err.is_precondition());
        assert!(err.to_string().contains("data"));
    }

    #[test]
    fn precondition_classification() {
        assert!(SaveError::NoCurrentSaveData.is_precondition());
        assert!(SaveError::NoCurrentConfigData.is_precondition());
        assert!(SaveError::AlreadyInitialized.is_precondition());
        assert!(!SaveError::ConfigNotFound.is_precondition());
    }

    #[test]
    fn not_found_classification() {
        assert!(SaveError::SlotNotFound { slot: 2 }.is_not_found());
        assert!(SaveError::ConfigNotFound.is_not_found());
        assert!(!SaveError::NoCurrentSaveData.is_not_found());
    }

    #[test]
    fn storage_error_converts() {
        let err: SaveError = StorageError::backend("boom").into();
        assert!(matches!(err, SaveError::Storage(_)));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn codec_error_converts() {
        let err: SaveError = CodecError::Decode {
            message: "bad json".to_string(),
        }
        .into();
        assert!(matches!(err, SaveError::Codec(_)));
    }
}
