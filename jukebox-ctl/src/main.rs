//! RFID Jukebox Controller (jukebox-ctl) - Main entry point
//!
//! Receives tag-sensor state changes over HTTP and drives a media player
//! through the home-automation platform.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use jukebox_common::config::TomlConfig;
use jukebox_common::events::EventBus;
use jukebox_ctl::api::{self, AppContext};
use jukebox_ctl::config::{Overrides, Settings, UnmappedSettings};
use jukebox_ctl::controller::{
    Announcer, ControllerConfig, ControllerHandle, TagPresenceController, UnmappedPolicy,
};
use jukebox_ctl::mapping::{StorageHandle, YamlMappingStore};
use jukebox_ctl::playback::{PlatformClient, PlaybackController, ServiceCaller};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Event bus capacity (events buffered per slow SSE client)
const EVENT_BUS_CAPACITY: usize = 100;

/// Command-line arguments for jukebox-ctl
#[derive(Parser, Debug)]
#[command(name = "jukebox-ctl")]
#[command(about = "RFID tag to media jukebox controller")]
#[command(version)]
struct Args {
    /// Path to TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "JUKEBOX_PORT")]
    port: Option<u16>,

    /// Entity id of the tag sensor
    #[arg(long, env = "JUKEBOX_TAG_SENSOR")]
    tag_sensor: Option<String>,

    /// Entity id of the playback device
    #[arg(long, env = "JUKEBOX_MEDIA_PLAYER")]
    media_player: Option<String>,

    /// Mapping file path
    #[arg(long, env = "JUKEBOX_MAPPING_FILE")]
    mapping_file: Option<PathBuf>,

    /// Filesystem provider id for folder mappings
    #[arg(long, env = "JUKEBOX_FILESYSTEM_ID")]
    filesystem_id: Option<String>,

    /// Base URL of the home-automation platform
    #[arg(long, env = "JUKEBOX_PLATFORM_URL")]
    platform_url: Option<String>,

    /// Platform access token
    #[arg(long, env = "JUKEBOX_HA_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            port: self.port,
            tag_sensor: self.tag_sensor.clone(),
            media_player: self.media_player.clone(),
            mapping_file: self.mapping_file.clone(),
            filesystem_id: self.filesystem_id.clone(),
            platform_url: self.platform_url.clone(),
            token: self.token.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (toml_config, config_file) = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration file")?;

    // Initialize tracing (RUST_LOG overrides the configured level)
    let level = &toml_config.logging.level;
    let default_filter = format!("jukebox_ctl={level},jukebox_common={level},tower_http={level}");
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting RFID jukebox controller v{}", env!("CARGO_PKG_VERSION"));
    match &config_file {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => warn!("No config file found, using built-in defaults"),
    }

    let settings = Settings::resolve(toml_config, config_file.as_deref(), args.overrides())
        .context("Invalid configuration")?;
    info!("Tag sensor: {}", settings.tag_sensor);
    info!("Media player: {}", settings.media_player);
    info!("Mapping file: {}", settings.mapping_file.display());
    if settings.filesystem_id.is_none() {
        info!("No filesystem id configured; folder mappings will not play");
    }

    // Storage worker and initial table
    let store = Arc::new(YamlMappingStore::new(settings.mapping_file.clone()));
    let (storage, storage_task) = StorageHandle::spawn(store);
    let table = storage
        .load()
        .await
        .context("Failed to load mapping table")?;

    // Playback service client
    let caller: Arc<dyn ServiceCaller> = Arc::new(
        PlatformClient::new(&settings.platform_url, settings.token.clone())
            .context("Failed to create platform client")?,
    );
    if settings.token.is_none() {
        warn!("No platform token configured; service calls are sent without authorization");
    }

    let playback = PlaybackController::new(
        Arc::clone(&caller),
        settings.media_player.clone(),
        settings.play_service.clone(),
    );
    let unmapped = match settings.unmapped.clone() {
        UnmappedSettings::Log => UnmappedPolicy::Log,
        UnmappedSettings::Clear => UnmappedPolicy::Clear,
        UnmappedSettings::Announce {
            service,
            entity_id,
            message,
        } => UnmappedPolicy::Announce(Announcer::new(caller, service, entity_id, message)),
    };

    let events = EventBus::new(EVENT_BUS_CAPACITY);
    let controller = TagPresenceController::new(
        ControllerConfig {
            tag_sensor: settings.tag_sensor.clone(),
            filesystem_id: settings.filesystem_id.clone(),
        },
        table,
        playback,
        unmapped,
        storage.clone(),
        events.clone(),
    );
    let (handle, dispatcher_task) = ControllerHandle::spawn(controller);

    let (ctx, closing) = AppContext::new(handle, events);
    let shutdown = async move {
        shutdown_signal().await;
        // Open SSE streams would otherwise keep the server alive
        let _ = closing.send(true);
    };
    api::run(settings.port, ctx, shutdown)
        .await
        .context("HTTP server failed")?;

    // Router is gone, so the dispatcher drains its queue and stops
    if let Err(e) = dispatcher_task.await {
        error!("Dispatcher task failed: {}", e);
    }

    // Wait for queued saves before exiting
    storage
        .flush()
        .await
        .context("Failed to flush mapping saves")?;
    drop(storage);
    if let Err(e) = storage_task.await {
        error!("Storage worker failed: {}", e);
    }

    info!("Shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
