//! Error types for jukebox-ctl
//!
//! None of these errors stops the controller. Each is terminal at the point
//! where it occurs: logged, and the controller carries on.

use thiserror::Error;

/// Main error type for jukebox-ctl
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Call to the playback or TTS service failed
    #[error("Playback service error: {0}")]
    PlaybackService(String),

    /// Mapping file could not be read, parsed or written
    #[error("Mapping file error: {0}")]
    MappingFile(String),

    /// Mapping-update request is missing a required field
    #[error("Invalid mapping request: {0}")]
    InvalidMappingRequest(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Other errors (closed channels, panicked workers)
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using jukebox-ctl Error
pub type Result<T> = std::result::Result<T, Error>;
