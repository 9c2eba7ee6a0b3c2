//! Event types for the jukebox event system
//!
//! The controller never holds references into presentation code. Anything that
//! wants to reflect controller state (SSE clients, dashboards, tests) subscribes
//! to the [`EventBus`] and receives typed [`JukeboxEvent`]s.

use crate::media::{MediaDescriptor, MediaKind};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Command kinds sent to the playback service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackCommand {
    /// Start new media from the beginning
    Start,
    /// Continue whatever is loaded on the device
    Resume,
    /// Pause the device
    Pause,
}

impl PlaybackCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackCommand::Start => "start",
            PlaybackCommand::Resume => "resume",
            PlaybackCommand::Pause => "pause",
        }
    }
}

/// Jukebox event types
///
/// Events are broadcast via EventBus and can be serialized for SSE transmission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JukeboxEvent {
    /// A tag different from the last observed one was presented
    ///
    /// Triggers:
    /// - SSE: Fill the "media to map" fields with the current mapping
    TagObserved {
        /// Tag id reported by the sensor
        tag: String,
        /// Resolved mapping (None if the tag is unmapped)
        media: Option<MediaDescriptor>,
        /// When the tag was observed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A mapping was written to the in-memory table
    ///
    /// Emitted before the mapping file is rewritten.
    MappingUpdated {
        /// Tag id that was mapped
        tag: String,
        /// New target of the tag
        media: MediaDescriptor,
        /// When the mapping changed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The in-memory table was replaced from the mapping file
    MappingsReloaded {
        /// Number of entries after the reload
        count: usize,
        /// When the reload finished
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Unmapped tag with the clear policy: UI reflection fields should be emptied
    ReflectionCleared {
        /// The unmapped tag that caused the clear
        tag: String,
        /// Kind the media-type selector resets to
        kind: MediaKind,
        /// When the clear was requested
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A command was sent to the playback service
    PlaybackCommandIssued {
        /// Start, resume or pause
        command: PlaybackCommand,
        /// Tag the command was issued for (None for pause/resume without session tag)
        tag: Option<String>,
        /// Media reference for start commands
        media_id: Option<String>,
        /// Whether the playback service accepted the command
        success: bool,
        /// When the command completed
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl JukeboxEvent {
    /// Event name used for the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            JukeboxEvent::TagObserved { .. } => "TagObserved",
            JukeboxEvent::MappingUpdated { .. } => "MappingUpdated",
            JukeboxEvent::MappingsReloaded { .. } => "MappingsReloaded",
            JukeboxEvent::ReflectionCleared { .. } => "ReflectionCleared",
            JukeboxEvent::PlaybackCommandIssued { .. } => "PlaybackCommandIssued",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// Uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block the controller)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use jukebox_common::events::{EventBus, JukeboxEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(JukeboxEvent::MappingsReloaded {
///     count: 3,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(matches!(rx.try_recv(), Ok(JukeboxEvent::MappingsReloaded { count: 3, .. })));
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<JukeboxEvent>,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<JukeboxEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: JukeboxEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
