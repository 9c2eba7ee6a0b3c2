//! What happens when a scanned tag has no mapping
//!
//! Exactly one policy is active per deployment. Applying a policy never fails:
//! announcement errors are logged and dropped.

use crate::playback::{ServiceAddress, ServiceCall, ServiceCaller};
use chrono::Utc;
use jukebox_common::events::{EventBus, JukeboxEvent};
use jukebox_common::MediaKind;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Placeholder replaced with the tag id in announcement templates
pub const TAG_PLACEHOLDER: &str = "{tag}";

/// Active unmapped-tag policy
pub enum UnmappedPolicy {
    /// Warning in the log, nothing else
    Log,
    /// Speak a message through a TTS service
    Announce(Announcer),
    /// Ask subscribers to empty their "media to map" fields
    Clear,
}

impl UnmappedPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            UnmappedPolicy::Log => "log",
            UnmappedPolicy::Announce(_) => "announce",
            UnmappedPolicy::Clear => "clear",
        }
    }

    pub async fn apply(&self, tag: &str, events: &EventBus) {
        warn!("Unmapped tag scanned: {}", tag);
        match self {
            UnmappedPolicy::Log => {}
            UnmappedPolicy::Announce(announcer) => announcer.announce(tag).await,
            UnmappedPolicy::Clear => events.emit_lossy(JukeboxEvent::ReflectionCleared {
                tag: tag.to_string(),
                kind: MediaKind::Playlist,
                timestamp: Utc::now(),
            }),
        }
    }
}

/// Speaks the unmapped-tag message on a device
pub struct Announcer {
    caller: Arc<dyn ServiceCaller>,
    service: ServiceAddress,
    entity_id: String,
    template: String,
}

impl Announcer {
    pub fn new(
        caller: Arc<dyn ServiceCaller>,
        service: ServiceAddress,
        entity_id: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            caller,
            service,
            entity_id: entity_id.into(),
            template: template.into(),
        }
    }

    /// Announcement text for `tag`
    pub fn message(&self, tag: &str) -> String {
        self.template.replace(TAG_PLACEHOLDER, tag)
    }

    async fn announce(&self, tag: &str) {
        let message = self.message(tag);
        info!("Announcing unmapped tag {} via {}", tag, self.service);
        let call = ServiceCall {
            address: self.service.clone(),
            data: json!({
                "entity_id": self.entity_id,
                "message": message,
            }),
        };
        if let Err(err) = self.caller.call(&call).await {
            error!("Unmapped-tag announcement failed: {}", err);
        }
    }
}
