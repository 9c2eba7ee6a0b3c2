//! # RFID Jukebox Controller Library (jukebox-ctl)
//!
//! Plays the media mapped to a scanned tag, pauses when the tag is removed and
//! resumes when the same tag comes back.
//!
//! **Architecture:** one tag-presence controller owned by a single dispatcher
//! task; mapping file I/O on a storage worker; playback through the
//! home-automation platform's REST service API; typed events on a broadcast bus.

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod mapping;
pub mod playback;
pub mod state;

pub use error::{Error, Result};
