//! Save and config document types.
//!
//! The engine is generic over the documents it persists. Two capability
//! traits describe what it needs from a document; [`SaveData`] and
//! [`ConfigData`] are the reference implementations most hosts can use
//! as-is, or embed inside richer types.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Capability bound for a save payload.
///
/// The engine only needs to know which slot a document occupies, how to
/// label it, and how to mark it as having round-tripped through storage.
pub trait SaveDocument: Serialize + DeserializeOwned + Send + 'static {
    /// The slot this document occupies.
    fn slot_index(&self) -> u32;

    /// Display label for slot pickers and headers.
    fn display_name(&self) -> &str;

    /// Called after a successful load from storage.
    ///
    /// `slot` is the slot the bytes were actually read from; a document
    /// copied between slots adopts the slot it was loaded from.
    fn mark_loaded(&mut self, slot: u32);
}

/// Capability bound for a config payload.
///
/// Config documents are opaque to the engine beyond (de)serialization.
pub trait ConfigDocument: Serialize + DeserializeOwned + Send + 'static {}

/// Reference save document: a labeled slot with an open string-to-string
/// field map that registered participants read and write.
///
/// The field map is ordered (`BTreeMap`) so that encoding the same
/// contents always produces identical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveData {
    name: String,
    slot_index: u32,
    fresh: bool,
    fields: BTreeMap<String, String>,
}

impl SaveData {
    /// Creates a fresh save document occupying `slot_index`.
    #[must_use]
    pub fn new(slot_index: u32, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slot_index,
            fresh: true,
            fields: BTreeMap::new(),
        }
    }

    /// The display label.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The slot this document occupies.
    #[must_use]
    pub const fn slot_index(&self) -> u32 {
        self.slot_index
    }

    /// True only for documents that have never been loaded from storage.
    #[must_use]
    pub const fn is_fresh(&self) -> bool {
        self.fresh
    }

    /// Upserts a field value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Looks up a field value, falling back to `default` when absent.
    #[must_use]
    pub fn get<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.fields.get(key).map_or(default, String::as_str)
    }

    /// Read-only view of the field map.
    #[must_use]
    pub const fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Number of stored fields.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Full multi-line dump of the document, one field per line.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("- name: {}\n", self.name));
        out.push_str(&format!("- slot: {}\n", self.slot_index));
        out.push_str(&format!("- fresh: {}\n", self.fresh));
        out.push_str("- fields:\n");
        for (key, value) in &self.fields {
            out.push_str(&format!("    - {key}: {value}\n"));
        }
        out
    }
}

impl fmt::Display for SaveData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Save: {} (slot {})", self.name, self.slot_index)
    }
}

impl SaveDocument for SaveData {
    fn slot_index(&self) -> u32 {
        self.slot_index
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn mark_loaded(&mut self, slot: u32) {
        self.slot_index = slot;
        self.fresh = false;
    }
}

/// Slot index sentinel meaning "no prior save recorded".
const NO_PREVIOUS_SLOT: i64 = -1;

/// Reference config document: remembers which slot was last successfully
/// loaded or saved, persisted as a single well-known file independent of
/// slot numbering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigData {
    previous_slot_index: i64,
}

impl ConfigData {
    /// Creates a config document with no previous slot recorded.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            previous_slot_index: NO_PREVIOUS_SLOT,
        }
    }

    /// True once a previous slot has been recorded.
    #[must_use]
    pub const fn has_previous_slot(&self) -> bool {
        self.previous_slot_index != NO_PREVIOUS_SLOT
    }

    /// The recorded previous slot, if any.
    #[must_use]
    pub fn previous_slot(&self) -> Option<u32> {
        u32::try_from(self.previous_slot_index).ok()
    }

    /// Records `slot` as the most recently used save slot.
    pub fn set_previous_slot(&mut self, slot: u32) {
        self.previous_slot_index = i64::from(slot);
    }

    /// Resets back to the "no prior save" sentinel.
    pub fn clear_previous_slot(&mut self) {
        self.previous_slot_index = NO_PREVIOUS_SLOT;
    }
}

impl Default for ConfigData {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigDocument for ConfigData {}

/// Lightweight per-slot metadata written alongside each persisted save,
/// so slot pickers can list saves without decoding full documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveHeader {
    /// Display label of the save occupying the slot.
    pub name: String,
    /// The slot the header describes.
    pub slot_index: u32,
    /// When the save was persisted.
    pub saved_at: DateTime<Utc>,
}

impl SaveHeader {
    /// Creates a header stamped with the current time.
    #[must_use]
    pub fn new(name: impl Into<String>, slot_index: u32) -> Self {
        Self {
            name: name.into(),
            slot_index,
            saved_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_save_data_has_empty_fields() {
        let data = SaveData::new(2, "Expedition");
        assert_eq!(data.name(), "Expedition");
        assert_eq!(data.slot_index(), 2);
        assert!(data.is_fresh());
        assert_eq!(data.field_count(), 0);
    }

    #[test]
    fn set_is_an_upsert() {
        let mut data = SaveData::new(0, "s");
        data.set("player.hp", "100");
        data.set("player.hp", "42");
        assert_eq!(data.get("player.hp", "0"), "42");
        assert_eq!(data.field_count(), 1);
    }

    #[test]
    fn get_falls_back_to_default() {
        let data = SaveData::new(0, "s");
        assert_eq!(data.get("missing", "fallback"), "fallback");
        assert_eq!(data.get("missing", ""), "");
    }

    #[test]
    fn mark_loaded_clears_freshness_and_adopts_slot() {
        let mut data = SaveData::new(3, "s");
        SaveDocument::mark_loaded(&mut data, 1);
        assert!(!data.is_fresh());
        assert_eq!(data.slot_index(), 1);
    }

    #[test]
    fn display_and_describe() {
        let mut data = SaveData::new(1, "Run");
        data.set("zone", "caves");
        assert_eq!(data.to_string(), "Save: Run (slot 1)");
        let dump = data.describe();
        assert!(dump.contains("- name: Run"));
        assert!(dump.contains("- zone: caves"));
    }

    #[test]
    fn config_sentinel_round_trip() {
        let mut config = ConfigData::new();
        assert!(!config.has_previous_slot());
        assert_eq!(config.previous_slot(), None);

        config.set_previous_slot(3);
        assert!(config.has_previous_slot());
        assert_eq!(config.previous_slot(), Some(3));

        config.clear_previous_slot();
        assert!(!config.has_previous_slot());
    }

    #[test]
    fn config_default_is_sentinel() {
        assert_eq!(ConfigData::default(), ConfigData::new());
    }

    #[test]
    fn save_header_carries_slot_and_name() {
        let header = SaveHeader::new("Run", 4);
        assert_eq!(header.name, "Run");
        assert_eq!(header.slot_index, 4);
    }
}
