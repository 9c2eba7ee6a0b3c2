//! Tag → media mapping table
//!
//! The mapping file has two entry shapes that coexist:
//! - **Legacy**: a bare string, the name of a playlist
//! - **Structured**: a record with `type`, `name` and optional `alias`
//!
//! Both are decoded once, at load time, into [`MappingEntry`]. Everything
//! downstream matches on the enum; nothing inspects raw YAML again.

pub mod resolver;
pub mod store;
pub mod worker;

pub use resolver::{folder_media_reference, resolve, Resolution};
pub use store::{MappingStore, YamlMappingStore};
pub use worker::StorageHandle;

use jukebox_common::{MappingRecord, MediaKind};
use std::collections::BTreeMap;

/// One entry of the mapping table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingEntry {
    /// Bare playlist name from the original single-value format
    Legacy(String),
    /// Structured record (kind, name, optional alias)
    Structured(MappingRecord),
}

impl MappingEntry {
    /// Structured record for persistence
    ///
    /// Legacy entries are upgraded: playlist kind, alias set to the tag id.
    pub fn to_record(&self, tag: &str) -> MappingRecord {
        match self {
            MappingEntry::Legacy(name) => MappingRecord {
                kind: MediaKind::Playlist,
                name: name.clone(),
                alias: Some(tag.to_string()),
            },
            MappingEntry::Structured(record) => record.clone(),
        }
    }
}

/// Tag id → mapping entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
    entries: BTreeMap<String, MappingEntry>,
}

impl MappingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tag: &str) -> Option<&MappingEntry> {
        self.entries.get(tag)
    }

    /// Insert or replace the entry for `tag`, returning the previous one
    pub fn insert(&mut self, tag: impl Into<String>, entry: MappingEntry) -> Option<MappingEntry> {
        self.entries.insert(tag.into(), entry)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whole table as structured records, the persisted and API form
    pub fn to_records(&self) -> BTreeMap<String, MappingRecord> {
        self.entries
            .iter()
            .map(|(tag, entry)| (tag.clone(), entry.to_record(tag)))
            .collect()
    }
}

impl FromIterator<(String, MappingEntry)> for MappingTable {
    fn from_iter<I: IntoIterator<Item = (String, MappingEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_entry_upgrades_to_record() {
        let entry = MappingEntry::Legacy("Road Trip Mix".to_string());
        let record = entry.to_record("AB12");

        assert_eq!(record.kind, MediaKind::Playlist);
        assert_eq!(record.name, "Road Trip Mix");
        assert_eq!(record.alias.as_deref(), Some("AB12"));
    }

    #[test]
    fn test_insert_replaces_existing_entry() {
        let mut table = MappingTable::new();
        assert!(table
            .insert("AB12", MappingEntry::Legacy("Old".to_string()))
            .is_none());

        let previous = table.insert("AB12", MappingEntry::Legacy("New".to_string()));
        assert_eq!(previous, Some(MappingEntry::Legacy("Old".to_string())));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("AB12"), Some(&MappingEntry::Legacy("New".to_string())));
    }

    #[test]
    fn test_to_records_keeps_structured_alias() {
        let table: MappingTable = [(
            "CD34".to_string(),
            MappingEntry::Structured(MappingRecord {
                kind: MediaKind::Folder,
                name: "Kids".to_string(),
                alias: None,
            }),
        )]
        .into_iter()
        .collect();

        let records = table.to_records();
        assert_eq!(records["CD34"].kind, MediaKind::Folder);
        assert!(records["CD34"].alias.is_none());
    }
}
