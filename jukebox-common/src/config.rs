//! TOML bootstrap configuration and config file resolution
//!
//! Config file lookup follows a fixed priority order:
//! 1. Command-line argument (highest priority)
//! 2. `JUKEBOX_CONFIG` environment variable
//! 3. Per-user config file (`~/.config/rfid-jukebox/config.toml` on Linux)
//! 4. System config file (`/etc/rfid-jukebox/config.toml`, Linux only)
//!
//! A missing config file is not an error: callers get [`TomlConfig::default`]
//! and CLI/environment overrides fill in the rest.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "JUKEBOX_CONFIG";

/// Directory name used below the platform config directory
const CONFIG_DIR_NAME: &str = "rfid-jukebox";

/// Config file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default mapping file name (relative to the config directory)
pub const DEFAULT_MAPPING_FILE: &str = "rfid_mappings.yaml";

/// Default HTTP port of jukebox-ctl
pub const DEFAULT_PORT: u16 = 5750;

/// Bootstrap configuration loaded from TOML file
///
/// Every field is optional in the file; required values are validated after
/// CLI/environment overrides have been merged in by the service.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    /// HTTP server port
    pub port: u16,

    /// Entity id of the tag sensor whose state changes drive the controller
    pub tag_sensor: Option<String>,

    /// Entity id of the playback device
    pub media_player: Option<String>,

    /// Mapping file path (relative paths resolve against the config file directory)
    pub mapping_file: PathBuf,

    /// Filesystem provider id used to build folder media references
    pub filesystem_id: Option<String>,

    /// Home-automation platform connection
    pub platform: PlatformConfig,

    /// Behavior for scanned tags without a mapping
    pub unmapped: UnmappedConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            tag_sensor: None,
            media_player: None,
            mapping_file: PathBuf::from(DEFAULT_MAPPING_FILE),
            filesystem_id: None,
            platform: PlatformConfig::default(),
            unmapped: UnmappedConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Home-automation platform REST API settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlatformConfig {
    /// Base URL, e.g. `http://homeassistant.local:8123`
    pub base_url: Option<String>,

    /// Long-lived access token (prefer the environment variable)
    pub token: Option<String>,

    /// `<domain>.<service>` used to start new media
    pub play_service: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            play_service: "music_assistant.play_media".to_string(),
        }
    }
}

/// Which unmapped-tag policy is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmappedPolicyKind {
    /// Log a warning only
    #[default]
    Log,
    /// Speak a message through the TTS service
    Announce,
    /// Clear UI reflection fields
    Clear,
}

/// Unmapped-tag policy settings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct UnmappedConfig {
    pub policy: UnmappedPolicyKind,

    /// Announcement template; `{tag}` is replaced with the tag id
    pub message: String,

    /// `<domain>.<service>` of the TTS service
    pub service: String,

    /// Announcement target (defaults to the playback device)
    pub entity_id: Option<String>,
}

impl Default for UnmappedConfig {
    fn default() -> Self {
        Self {
            policy: UnmappedPolicyKind::Log,
            message: "This tag is not mapped yet".to_string(),
            service: "tts.google_translate_say".to_string(),
            entity_id: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the config file if one can be located, otherwise use defaults
    ///
    /// Returns the config together with the file it came from. A located file
    /// that fails to parse is an error; an absent file is not.
    pub fn load_or_default(cli_path: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        match locate_config_file(cli_path) {
            Some(path) => {
                let config = Self::load(&path)?;
                Ok((config, Some(path)))
            }
            None => Ok((Self::default(), None)),
        }
    }
}

/// Locate the config file following the documented priority order
///
/// Explicit paths (CLI or environment) are returned even if they do not exist,
/// so that a typo surfaces as a read error instead of silently using defaults.
pub fn locate_config_file(cli_path: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Per-user config
    if let Some(path) = dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)) {
        if path.exists() {
            return Some(path);
        }
    }

    // Priority 4: System config (Linux)
    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc")
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME);
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Resolve a possibly relative path against the directory of the config file
///
/// Without a config file, relative paths stay relative to the working directory.
pub fn resolve_relative(path: &Path, config_file: Option<&Path>) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match config_file.and_then(Path::parent) {
        Some(dir) => dir.join(path),
        None => path.to_path_buf(),
    }
}
