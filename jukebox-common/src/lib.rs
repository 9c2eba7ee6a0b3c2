//! # RFID Jukebox Common Library
//!
//! Shared code for the jukebox services including:
//! - Mapping data model (media kinds, descriptors, persisted records)
//! - Event types (JukeboxEvent enum) and the EventBus
//! - TOML bootstrap configuration loading
//! - Common error type

pub mod config;
pub mod error;
pub mod events;
pub mod media;

pub use error::{Error, Result};
pub use media::{MediaDescriptor, MediaKind, MappingRecord};
