//! Tag → media descriptor resolution

use super::{MappingEntry, MappingTable};
use jukebox_common::{MediaDescriptor, MediaKind};

/// Outcome of resolving a tag against the mapping table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Mapped(MediaDescriptor),
    Unmapped,
}

impl Resolution {
    pub fn into_option(self) -> Option<MediaDescriptor> {
        match self {
            Resolution::Mapped(media) => Some(media),
            Resolution::Unmapped => None,
        }
    }
}

/// Resolve `tag` to its canonical media descriptor
///
/// An entry with an empty name resolves to [`Resolution::Unmapped`] so that no
/// playback command is ever issued with an empty media id.
pub fn resolve(table: &MappingTable, tag: &str) -> Resolution {
    let Some(entry) = table.get(tag) else {
        return Resolution::Unmapped;
    };

    let (kind, name, alias) = match entry {
        MappingEntry::Legacy(name) => (MediaKind::Playlist, name, None),
        MappingEntry::Structured(record) => (record.kind, &record.name, record.alias.as_deref()),
    };

    if name.trim().is_empty() {
        return Resolution::Unmapped;
    }

    Resolution::Mapped(MediaDescriptor {
        kind,
        name: name.clone(),
        alias: alias
            .filter(|alias| !alias.is_empty())
            .unwrap_or(tag)
            .to_string(),
    })
}

/// Build the media reference for a folder on a filesystem provider
///
/// `" /Kids\\Songs "` on `local` becomes `local://folder/Kids/Songs`.
pub fn folder_media_reference(filesystem_id: &str, folder: &str) -> String {
    let path = folder
        .trim()
        .trim_start_matches(|c: char| c == '/' || c == '\\')
        .replace('\\', "/");
    format!("{}://folder/{}", filesystem_id, path)
}
