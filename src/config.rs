//! Engine configuration and storage-key naming policy.

/// Default number of save slots.
pub const DEFAULT_SLOT_COUNT: u32 = 5;
/// Default save file extension.
pub const DEFAULT_FILE_EXTENSION: &str = "sav";
/// Default save file name prefix.
pub const DEFAULT_SAVE_FILE_NAME_PREFIX: &str = "save";
/// Default save header file name prefix.
pub const DEFAULT_SAVE_HEADER_FILE_NAME_PREFIX: &str = "saveheader";
/// Default config file name.
pub const DEFAULT_CONFIG_FILE_NAME: &str = "config.ini";
/// Default participant budget per scheduling quantum.
pub const DEFAULT_MAX_SAVABLES_PER_QUANTUM: usize = 100;

/// Engine configuration, supplied at construction and immutable after.
///
/// The naming fields produce storage keys, not filesystem paths; the
/// bound [`StorageHandler`](crate::storage::StorageHandler) owns the
/// mapping to physical storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum number of save slots.
    pub slot_count: u32,
    /// Extension shared by save and header keys.
    pub file_extension: String,
    /// Prefix for save slot keys.
    pub save_file_name_prefix: String,
    /// Prefix for per-slot header keys.
    pub save_header_file_name_prefix: String,
    /// Fixed key for the config document.
    pub config_file_name: String,
    /// Participants processed before the engine yields a quantum.
    ///
    /// The bound is approximate: the iteration yields after every
    /// `max_savables_per_quantum + 1` participants processed.
    pub max_savables_per_quantum: usize,
}

impl EngineConfig {
    /// Storage key for the save document in `slot`.
    #[must_use]
    pub fn save_file_name(&self, slot: u32) -> String {
        format!(
            "{}{}.{}",
            self.save_file_name_prefix, slot, self.file_extension
        )
    }

    /// Storage key for the header of `slot`.
    #[must_use]
    pub fn save_header_file_name(&self, slot: u32) -> String {
        format!(
            "{}{}.{}",
            self.save_header_file_name_prefix, slot, self.file_extension
        )
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            slot_count: DEFAULT_SLOT_COUNT,
            file_extension: DEFAULT_FILE_EXTENSION.to_string(),
            save_file_name_prefix: DEFAULT_SAVE_FILE_NAME_PREFIX.to_string(),
            save_header_file_name_prefix: DEFAULT_SAVE_HEADER_FILE_NAME_PREFIX.to_string(),
            config_file_name: DEFAULT_CONFIG_FILE_NAME.to_string(),
            max_savables_per_quantum: DEFAULT_MAX_SAVABLES_PER_QUANTUM,
        }
    }
}
