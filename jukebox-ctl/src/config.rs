//! Runtime settings for jukebox-ctl
//!
//! Settings sources, highest priority first:
//! 1. Command-line arguments / environment variables ([`Overrides`])
//! 2. TOML bootstrap file ([`TomlConfig`])
//! 3. Built-in defaults
//!
//! Tag sensor, media player and platform base URL have no default and must
//! come from one of the first two sources.

use crate::error::{Error, Result};
use crate::playback::ServiceAddress;
use jukebox_common::config::{resolve_relative, TomlConfig, UnmappedPolicyKind};
use std::path::{Path, PathBuf};

/// Values given on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub tag_sensor: Option<String>,
    pub media_player: Option<String>,
    pub mapping_file: Option<PathBuf>,
    pub filesystem_id: Option<String>,
    pub platform_url: Option<String>,
    pub token: Option<String>,
}

/// Unmapped-tag policy settings, validated
#[derive(Debug, Clone, PartialEq)]
pub enum UnmappedSettings {
    Log,
    Announce {
        service: ServiceAddress,
        entity_id: String,
        message: String,
    },
    Clear,
}

/// Fully merged and validated settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub tag_sensor: String,
    pub media_player: String,
    pub mapping_file: PathBuf,
    pub filesystem_id: Option<String>,
    pub platform_url: String,
    pub token: Option<String>,
    pub play_service: ServiceAddress,
    pub unmapped: UnmappedSettings,
    pub log_level: String,
}

impl Settings {
    /// Merge `overrides` over `toml` and validate the result
    ///
    /// `config_file` is the file `toml` was read from; relative mapping-file
    /// paths from the TOML resolve against its directory. A mapping-file path
    /// given as an override is used as-is.
    pub fn resolve(
        toml: TomlConfig,
        config_file: Option<&Path>,
        overrides: Overrides,
    ) -> Result<Self> {
        let tag_sensor = required(overrides.tag_sensor.or(toml.tag_sensor), "tag_sensor")?;
        let media_player = required(overrides.media_player.or(toml.media_player), "media_player")?;
        let platform_url = required(
            overrides.platform_url.or(toml.platform.base_url),
            "platform.base_url",
        )?;

        let mapping_file = match overrides.mapping_file {
            Some(path) => path,
            None => resolve_relative(&toml.mapping_file, config_file),
        };

        let play_service: ServiceAddress = toml.platform.play_service.parse()?;

        let unmapped = match toml.unmapped.policy {
            UnmappedPolicyKind::Log => UnmappedSettings::Log,
            UnmappedPolicyKind::Clear => UnmappedSettings::Clear,
            UnmappedPolicyKind::Announce => UnmappedSettings::Announce {
                service: toml.unmapped.service.parse()?,
                entity_id: non_empty(toml.unmapped.entity_id)
                    .unwrap_or_else(|| media_player.clone()),
                message: toml.unmapped.message,
            },
        };

        Ok(Self {
            port: overrides.port.unwrap_or(toml.port),
            tag_sensor,
            media_player,
            mapping_file,
            filesystem_id: non_empty(overrides.filesystem_id.or(toml.filesystem_id)),
            platform_url,
            token: non_empty(overrides.token.or(toml.platform.token)),
            play_service,
            unmapped,
            log_level: toml.logging.level,
        })
    }
}

fn required(value: Option<String>, name: &str) -> Result<String> {
    non_empty(value).ok_or_else(|| {
        Error::Config(format!(
            "'{}' is not set (config file, command line or environment)",
            name
        ))
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_toml() -> TomlConfig {
        toml::from_str(
            r#"
            tag_sensor = "sensor.rfid_reader_tag"
            media_player = "media_player.living_room"

            [platform]
            base_url = "http://ha.local:8123"
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_minimal_config() {
        let settings = Settings::resolve(minimal_toml(), None, Overrides::default()).unwrap();
        assert_eq!(settings.port, 5750);
        assert_eq!(settings.tag_sensor, "sensor.rfid_reader_tag");
        assert_eq!(settings.media_player, "media_player.living_room");
        assert_eq!(settings.mapping_file, PathBuf::from("rfid_mappings.yaml"));
        assert_eq!(settings.filesystem_id, None);
        assert_eq!(settings.play_service.to_string(), "music_assistant.play_media");
        assert_eq!(settings.unmapped, UnmappedSettings::Log);
    }

    #[test]
    fn test_missing_required_fields() {
        let err = Settings::resolve(TomlConfig::default(), None, Overrides::default()).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("tag_sensor")));

        let mut toml = minimal_toml();
        toml.platform.base_url = Some("   ".to_string());
        let err = Settings::resolve(toml, None, Overrides::default()).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("platform.base_url")));
    }

    #[test]
    fn test_overrides_win() {
        let overrides = Overrides {
            port: Some(6000),
            media_player: Some("media_player.kitchen".to_string()),
            mapping_file: Some(PathBuf::from("tags.yaml")),
            filesystem_id: Some("filesystem_local".to_string()),
            token: Some("secret".to_string()),
            ..Default::default()
        };
        let config_file = Path::new("/etc/rfid-jukebox/config.toml");
        let settings = Settings::resolve(minimal_toml(), Some(config_file), overrides).unwrap();
        assert_eq!(settings.port, 6000);
        assert_eq!(settings.media_player, "media_player.kitchen");
        assert_eq!(settings.mapping_file, PathBuf::from("tags.yaml"));
        assert_eq!(settings.filesystem_id.as_deref(), Some("filesystem_local"));
        assert_eq!(settings.token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_mapping_file_relative_to_config() {
        let settings = Settings::resolve(
            minimal_toml(),
            Some(Path::new("/etc/rfid-jukebox/config.toml")),
            Overrides::default(),
        )
        .unwrap();
        assert_eq!(
            settings.mapping_file,
            PathBuf::from("/etc/rfid-jukebox/rfid_mappings.yaml")
        );
    }

    #[test]
    fn test_empty_filesystem_id_is_unset() {
        let mut toml = minimal_toml();
        toml.filesystem_id = Some(String::new());
        let settings = Settings::resolve(toml, None, Overrides::default()).unwrap();
        assert_eq!(settings.filesystem_id, None);
    }

    #[test]
    fn test_announce_defaults_to_media_player() {
        let mut toml = minimal_toml();
        toml.unmapped.policy = UnmappedPolicyKind::Announce;
        toml.unmapped.message = "Unknown tag {tag}".to_string();
        let settings = Settings::resolve(toml, None, Overrides::default()).unwrap();
        assert_eq!(
            settings.unmapped,
            UnmappedSettings::Announce {
                service: ServiceAddress::new("tts", "google_translate_say"),
                entity_id: "media_player.living_room".to_string(),
                message: "Unknown tag {tag}".to_string(),
            }
        );
    }

    #[test]
    fn test_bad_service_address() {
        let mut toml = minimal_toml();
        toml.platform.play_service = "play_media".to_string();
        assert!(matches!(
            Settings::resolve(toml, None, Overrides::default()),
            Err(Error::Config(_))
        ));
    }
}
