//! Playback control on the output device
//!
//! Three commands, each a single awaited service call. Failures are logged
//! here and returned to the caller, which only inspects them for reporting;
//! nothing is retried and session state is never rolled back.

pub mod platform;
pub mod service;

pub use platform::PlatformClient;
pub use service::{ServiceAddress, ServiceCall, ServiceCaller};

use crate::error::Result;
use jukebox_common::MediaKind;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

/// Issues start/resume/pause commands for one output device
#[derive(Clone)]
pub struct PlaybackController {
    caller: Arc<dyn ServiceCaller>,
    entity_id: String,
    play_service: ServiceAddress,
}

impl PlaybackController {
    /// * `entity_id` - output device (e.g. `media_player.living_room`)
    /// * `play_service` - service used to start new media
    pub fn new(
        caller: Arc<dyn ServiceCaller>,
        entity_id: impl Into<String>,
        play_service: ServiceAddress,
    ) -> Self {
        Self {
            caller,
            entity_id: entity_id.into(),
            play_service,
        }
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// Start `media_id` from the beginning
    pub async fn start(&self, kind: MediaKind, media_id: &str) -> Result<()> {
        info!("Starting new {} '{}'", kind, media_id);
        let call = ServiceCall {
            address: self.play_service.clone(),
            data: json!({
                "entity_id": self.entity_id,
                "media_id": media_id,
                "media_type": kind.as_str(),
            }),
        };
        self.caller.call(&call).await.map_err(|err| {
            error!(
                "Error playing {} '{}': {}. Check that it exists on the playback service.",
                kind, media_id, err
            );
            err
        })
    }

    /// Continue whatever is loaded on the device
    pub async fn resume(&self) -> Result<()> {
        info!("Resuming playback");
        self.device_command("media_play").await
    }

    /// Pause the device
    pub async fn pause(&self) -> Result<()> {
        info!("Pausing player");
        self.device_command("media_pause").await
    }

    async fn device_command(&self, service: &str) -> Result<()> {
        let call = ServiceCall {
            address: ServiceAddress::new("media_player", service),
            data: json!({ "entity_id": self.entity_id }),
        };
        self.caller.call(&call).await.map_err(|err| {
            error!("Error calling media_player.{}: {}", service, err);
            err
        })
    }
}
