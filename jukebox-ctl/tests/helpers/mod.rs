//! Shared test fixtures for jukebox-ctl integration tests
//!
//! - [`RecordingCaller`]: service-call fake that records every call and can be
//!   told to fail specific services
//! - [`Harness`]: a controller wired to the fake, a temp mapping file and an
//!   event bus

#![allow(dead_code)]

use async_trait::async_trait;
use jukebox_common::events::{EventBus, JukeboxEvent};
use jukebox_ctl::controller::{
    Announcer, ControllerConfig, TagPresenceController, UnmappedPolicy,
};
use jukebox_ctl::mapping::{MappingStore, StorageHandle, YamlMappingStore};
use jukebox_ctl::playback::{PlaybackController, ServiceAddress, ServiceCall, ServiceCaller};
use jukebox_ctl::{Error, Result};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::broadcast;

pub const TAG_SENSOR: &str = "sensor.rfid_reader_tag";
pub const MEDIA_PLAYER: &str = "media_player.living_room";
pub const PLAY_SERVICE: &str = "music_assistant.play_media";
pub const TTS_SERVICE: &str = "tts.google_translate_say";

/// Records service calls instead of sending them
#[derive(Default)]
pub struct RecordingCaller {
    calls: Mutex<Vec<ServiceCall>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingCaller {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every later call to `service` (`<domain>.<service>`) fail
    pub fn fail_service(&self, service: &str) {
        self.failing.lock().unwrap().insert(service.to_string());
    }

    pub fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Service addresses called so far, in order
    pub fn services(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|call| call.address.to_string())
            .collect()
    }

    pub fn count(&self, service: &str) -> usize {
        self.services().iter().filter(|s| *s == service).count()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl ServiceCaller for RecordingCaller {
    async fn call(&self, call: &ServiceCall) -> Result<()> {
        self.calls.lock().unwrap().push(call.clone());
        let address = call.address.to_string();
        if self.failing.lock().unwrap().contains(&address) {
            return Err(Error::PlaybackService(format!("{} returned 500", address)));
        }
        Ok(())
    }
}

/// Which unmapped-tag policy the harness installs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unmapped {
    Log,
    Announce,
    Clear,
}

pub struct Options {
    pub filesystem_id: Option<String>,
    pub unmapped: Unmapped,
    /// Place the mapping file under a regular file so every save fails
    pub unwritable_mapping_file: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            filesystem_id: Some("local".to_string()),
            unmapped: Unmapped::Log,
            unwritable_mapping_file: false,
        }
    }
}

pub struct Harness {
    pub controller: TagPresenceController,
    pub caller: Arc<RecordingCaller>,
    pub storage: StorageHandle,
    pub events: EventBus,
    pub rx: broadcast::Receiver<JukeboxEvent>,
    pub mapping_file: PathBuf,
    pub dir: TempDir,
}

impl Harness {
    /// Controller over a mapping file containing `mappings` (YAML), default options
    pub async fn new(mappings: &str) -> Self {
        Self::with_options(mappings, Options::default()).await
    }

    pub async fn with_options(mappings: &str, options: Options) -> Self {
        let dir = TempDir::new().unwrap();
        let mapping_file = if options.unwritable_mapping_file {
            let blocker = dir.path().join("not_a_dir");
            std::fs::write(&blocker, "").unwrap();
            blocker.join("rfid_mappings.yaml")
        } else {
            dir.path().join("rfid_mappings.yaml")
        };
        if !mappings.is_empty() {
            std::fs::write(&mapping_file, mappings).unwrap();
        }

        let store: Arc<dyn MappingStore> = Arc::new(YamlMappingStore::new(&mapping_file));
        let table = store.load();
        let (storage, _task) = StorageHandle::spawn(store);

        let caller = RecordingCaller::new();
        let dyn_caller: Arc<dyn ServiceCaller> = caller.clone();

        let playback = PlaybackController::new(
            Arc::clone(&dyn_caller),
            MEDIA_PLAYER,
            PLAY_SERVICE.parse().unwrap(),
        );
        let unmapped = match options.unmapped {
            Unmapped::Log => UnmappedPolicy::Log,
            Unmapped::Clear => UnmappedPolicy::Clear,
            Unmapped::Announce => UnmappedPolicy::Announce(Announcer::new(
                dyn_caller,
                ServiceAddress::new("tts", "google_translate_say"),
                MEDIA_PLAYER,
                "Tag {tag} is not mapped",
            )),
        };

        let events = EventBus::new(100);
        let rx = events.subscribe();

        let controller = TagPresenceController::new(
            ControllerConfig {
                tag_sensor: TAG_SENSOR.to_string(),
                filesystem_id: options.filesystem_id,
            },
            table,
            playback,
            unmapped,
            storage.clone(),
            events.clone(),
        );

        Self {
            controller,
            caller,
            storage,
            events,
            rx,
            mapping_file,
            dir,
        }
    }

    /// Feed a sequence of raw sensor values
    pub async fn scan(&mut self, values: &[&str]) {
        for value in values {
            self.controller.handle_sensor_value(value).await;
        }
    }

    /// Events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<JukeboxEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Current content of the mapping file, if it exists
    pub async fn mapping_file_content(&self) -> Option<String> {
        self.storage.flush().await.unwrap();
        std::fs::read_to_string(&self.mapping_file).ok()
    }
}
