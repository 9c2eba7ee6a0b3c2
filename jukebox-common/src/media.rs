//! Media mapping data model
//!
//! Types shared between the mapping file, the HTTP API and the event stream:
//! - [`MediaKind`]: what a tag plays (playlist or folder)
//! - [`MediaDescriptor`]: the canonical, resolved playback target of a tag
//! - [`MappingRecord`]: the structured on-disk / on-wire form of a mapping entry

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Kind of media a tag is mapped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Named playlist on the playback service
    #[default]
    Playlist,
    /// Folder on a playback-service filesystem provider
    Folder,
}

impl MediaKind {
    /// Parse a kind string, falling back to [`MediaKind::Playlist`] for
    /// anything that is not recognizably "folder".
    pub fn parse_lenient(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("folder") {
            MediaKind::Folder
        } else {
            MediaKind::Playlist
        }
    }

    /// Wire name used in mapping files and playback commands
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Playlist => "playlist",
            MediaKind::Folder => "folder",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical resolved target of a tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    /// Playlist or folder
    pub kind: MediaKind,
    /// Playlist name or folder path (never empty)
    pub name: String,
    /// Display string (the tag id when no alias was stored)
    pub alias: String,
}

/// Structured mapping record as stored in the mapping file
///
/// `type` is read leniently: a missing or unrecognized value means playlist.
/// A missing `name` deserializes to an empty string; such records never resolve.
/// Every field accepts any scalar, so hand-edited files with `name: 1989` or
/// `alias: 42` keep their entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRecord {
    #[serde(rename = "type", default, deserialize_with = "deserialize_kind")]
    pub kind: MediaKind,
    #[serde(default, deserialize_with = "deserialize_text")]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub alias: Option<String>,
}

/// Any scalar a YAML or JSON document may hold in a text field
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Bool(b) => b.to_string(),
            Scalar::Int(n) => n.to_string(),
            Scalar::UInt(n) => n.to_string(),
            Scalar::Float(n) => n.to_string(),
            Scalar::Text(s) => s,
        }
    }
}

fn deserialize_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Scalar> = Option::deserialize(deserializer)?;
    Ok(raw.map(Scalar::into_text))
}

fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_optional_text(deserializer)?.unwrap_or_default())
}

fn deserialize_kind<'de, D>(deserializer: D) -> Result<MediaKind, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = deserialize_optional_text(deserializer)?;
    Ok(raw.as_deref().map(MediaKind::parse_lenient).unwrap_or_default())
}
