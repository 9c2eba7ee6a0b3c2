//! Tag-presence state machine
//!
//! Consumes sensor values and decides, per value, whether to start, resume,
//! pause, or hand the tag to the unmapped policy. Also owns the in-memory
//! mapping table and applies mapping updates to it.
//!
//! The controller is owned by the dispatcher task (see [`super::dispatcher`]),
//! so every method takes `&mut self` and runs to completion before the next
//! event is looked at.

use super::request::{MapLastTagRequest, MapTagRequest};
use super::unmapped::UnmappedPolicy;
use crate::error::{Error, Result};
use crate::mapping::{
    folder_media_reference, resolve, MappingEntry, MappingTable, Resolution, StorageHandle,
};
use crate::playback::PlaybackController;
use crate::state::{canonical_tag, SessionState};
use chrono::Utc;
use jukebox_common::events::{EventBus, JukeboxEvent, PlaybackCommand};
use jukebox_common::{MappingRecord, MediaDescriptor, MediaKind};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, error, info};

/// New state of the tag sensor
#[derive(Debug, Clone, Deserialize)]
pub struct SensorState {
    pub state: String,
}

/// Sensor state-change notification as forwarded by the platform
///
/// `new_state` is null when the sensor entity itself was removed.
#[derive(Debug, Clone, Deserialize)]
pub struct SensorEvent {
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub new_state: Option<SensorState>,
}

impl SensorEvent {
    /// Event carrying `value` for an unspecified entity
    pub fn value(value: impl Into<String>) -> Self {
        Self {
            entity_id: None,
            new_state: Some(SensorState { state: value.into() }),
        }
    }
}

/// Static settings of one controller instance
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Entity id of the tag sensor; events for other entities are ignored
    pub tag_sensor: String,
    /// Filesystem provider id for folder mappings
    pub filesystem_id: Option<String>,
}

pub struct TagPresenceController {
    config: ControllerConfig,
    table: MappingTable,
    session: SessionState,
    playback: PlaybackController,
    unmapped: UnmappedPolicy,
    storage: StorageHandle,
    events: EventBus,
}

impl TagPresenceController {
    pub fn new(
        config: ControllerConfig,
        table: MappingTable,
        playback: PlaybackController,
        unmapped: UnmappedPolicy,
        storage: StorageHandle,
        events: EventBus,
    ) -> Self {
        info!(
            "Tag controller ready: sensor={}, player={}, {} mappings, unmapped policy={}",
            config.tag_sensor,
            playback.entity_id(),
            table.len(),
            unmapped.name()
        );
        Self {
            config,
            table,
            session: SessionState::new(),
            playback,
            unmapped,
            storage,
            events,
        }
    }

    /// Handle a state-change notification
    pub async fn handle_sensor_event(&mut self, event: SensorEvent) {
        if let Some(entity_id) = event.entity_id.as_deref() {
            if entity_id != self.config.tag_sensor {
                debug!("Ignoring state change of {}", entity_id);
                return;
            }
        }

        let Some(new_state) = event.new_state else {
            debug!("Tag sensor has no state; ignoring");
            return;
        };

        self.handle_sensor_value(&new_state.state).await;
    }

    /// Handle one raw sensor value
    pub async fn handle_sensor_value(&mut self, value: &str) {
        debug!("Tag sensor changed to '{}'", value);

        match canonical_tag(value) {
            None => self.tag_removed().await,
            Some(tag) => self.tag_presented(tag).await,
        }
    }

    async fn tag_removed(&mut self) {
        if self.session.current_tag.is_none() {
            debug!("Tag removed with nothing playing");
            return;
        }

        info!("Tag removed, pausing playback");
        let result = self.playback.pause().await;
        self.report(PlaybackCommand::Pause, None, result.is_ok());
    }

    async fn tag_presented(&mut self, tag: &str) {
        if self.session.last_tag.as_deref() != Some(tag) {
            self.session.last_tag = Some(tag.to_string());
            let media = resolve(&self.table, tag).into_option();
            self.events.emit_lossy(JukeboxEvent::TagObserved {
                tag: tag.to_string(),
                media,
                timestamp: Utc::now(),
            });
        }

        if self.session.current_tag.as_deref() == Some(tag) {
            info!("Same tag {} presented again, resuming", tag);
            let result = self.playback.resume().await;
            self.report(PlaybackCommand::Resume, None, result.is_ok());
            return;
        }

        info!("New tag {} detected", tag);
        self.session.current_tag = Some(tag.to_string());

        match resolve(&self.table, tag) {
            Resolution::Mapped(media) => self.start(tag, media).await,
            Resolution::Unmapped => {
                self.session.current_tag = None;
                self.unmapped.apply(tag, &self.events).await;
            }
        }
    }

    async fn start(&mut self, tag: &str, media: MediaDescriptor) {
        let media_id = match media.kind {
            MediaKind::Playlist => media.name,
            MediaKind::Folder => match self.config.filesystem_id.as_deref() {
                Some(filesystem_id) => folder_media_reference(filesystem_id, &media.name),
                None => {
                    error!(
                        "Tag {} is mapped to folder '{}' but no filesystem id is configured",
                        tag, media.name
                    );
                    return;
                }
            },
        };

        // A failed start leaves current_tag set; the next scan of this tag resumes
        let result = self.playback.start(media.kind, &media_id).await;
        self.report(PlaybackCommand::Start, Some(media_id), result.is_ok());
    }

    fn report(&self, command: PlaybackCommand, media_id: Option<String>, success: bool) {
        debug!(
            "Playback {} for tag {:?}: {}",
            command.as_str(),
            self.session.current_tag,
            if success { "ok" } else { "failed" }
        );
        self.events.emit_lossy(JukeboxEvent::PlaybackCommandIssued {
            command,
            tag: self.session.current_tag.clone(),
            media_id,
            success,
            timestamp: Utc::now(),
        });
    }

    /// Record a mapping and queue it for persistence
    ///
    /// Rejected requests leave the table untouched and are not persisted.
    pub fn map_tag(&mut self, request: MapTagRequest) -> Result<MediaDescriptor> {
        let (tag, record) = request.validate().map_err(|err| {
            error!("{}", err);
            err
        })?;

        info!("Mapping tag {} to {} '{}'", tag, record.kind, record.name);
        self.table.insert(tag.clone(), MappingEntry::Structured(record));

        let media = resolve(&self.table, &tag).into_option().ok_or_else(|| {
            Error::Internal(format!("mapping for {} did not resolve after insert", tag))
        })?;

        self.events.emit_lossy(JukeboxEvent::MappingUpdated {
            tag,
            media: media.clone(),
            timestamp: Utc::now(),
        });
        self.storage.save(self.table.clone());

        Ok(media)
    }

    /// Map the most recently scanned tag
    pub fn map_last_tag(&mut self, request: MapLastTagRequest) -> Result<MediaDescriptor> {
        let request = request.for_tag(self.session.last_tag.clone());
        self.map_tag(request)
    }

    /// Replace the in-memory table with the persisted one
    ///
    /// Goes through the storage worker, so every save queued before the reload
    /// is on disk when the file is read.
    pub async fn reload_mappings(&mut self) -> Result<usize> {
        let table = self.storage.load().await?;
        let count = table.len();
        self.table = table;

        info!("Reloaded {} mappings", count);
        self.events.emit_lossy(JukeboxEvent::MappingsReloaded {
            count,
            timestamp: Utc::now(),
        });

        Ok(count)
    }

    pub fn session(&self) -> SessionState {
        self.session.clone()
    }

    /// Table snapshot as structured records
    pub fn mappings(&self) -> BTreeMap<String, MappingRecord> {
        self.table.to_records()
    }
}
