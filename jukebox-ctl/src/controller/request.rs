//! Mapping-update requests

use crate::error::{Error, Result};
use jukebox_common::{MappingRecord, MediaKind};
use serde::Deserialize;

/// `map_tag` service call: `{tag_id, media_type?, media_name, alias?}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MapTagRequest {
    pub tag_id: Option<String>,
    pub media_type: Option<String>,
    pub media_name: Option<String>,
    pub alias: Option<String>,
}

/// "Map scanned tag" UI action: the tag is the last one observed
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MapLastTagRequest {
    pub media_type: Option<String>,
    pub media_name: Option<String>,
    pub alias: Option<String>,
}

impl MapLastTagRequest {
    pub fn for_tag(self, tag_id: Option<String>) -> MapTagRequest {
        MapTagRequest {
            tag_id,
            media_type: self.media_type,
            media_name: self.media_name,
            alias: self.alias,
        }
    }
}

impl MapTagRequest {
    /// Check required fields and build the structured record to store
    ///
    /// Alias defaults to the tag id; media type defaults to playlist.
    pub fn validate(self) -> Result<(String, MappingRecord)> {
        let tag_id = self.tag_id.filter(|t| !t.trim().is_empty());
        let media_name = self.media_name.filter(|n| !n.trim().is_empty());

        let (tag_id, name) = match (tag_id, media_name) {
            (Some(tag_id), Some(name)) => (tag_id, name),
            (tag_id, name) => {
                return Err(Error::InvalidMappingRequest(format!(
                    "Tag ID or Media Name is missing. Tag: '{}', Media: '{}'",
                    tag_id.unwrap_or_default(),
                    name.unwrap_or_default()
                )))
            }
        };

        let kind = self
            .media_type
            .as_deref()
            .map(MediaKind::parse_lenient)
            .unwrap_or_default();
        let alias = self
            .alias
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| tag_id.clone());

        Ok((
            tag_id,
            MappingRecord {
                kind,
                name,
                alias: Some(alias),
            },
        ))
    }
}
