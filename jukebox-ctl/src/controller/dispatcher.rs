//! Single-consumer dispatcher
//!
//! The controller lives inside one task and is reached only through
//! [`ControllerHandle`]. Sensor events and mapping requests share one queue,
//! so they are applied strictly one at a time in arrival order. Replies travel
//! back on oneshot channels.

use super::presence::{SensorEvent, TagPresenceController};
use super::request::{MapLastTagRequest, MapTagRequest};
use crate::error::{Error, Result};
use crate::state::SessionState;
use jukebox_common::{MappingRecord, MediaDescriptor};
use std::collections::BTreeMap;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Queue depth before senders wait
pub const COMMAND_QUEUE_CAPACITY: usize = 64;

enum Command {
    Sensor(SensorEvent),
    MapTag(MapTagRequest, oneshot::Sender<Result<MediaDescriptor>>),
    MapLastTag(MapLastTagRequest, oneshot::Sender<Result<MediaDescriptor>>),
    Reload(oneshot::Sender<Result<usize>>),
    Session(oneshot::Sender<SessionState>),
    Mappings(oneshot::Sender<BTreeMap<String, MappingRecord>>),
}

/// Cloneable handle to the dispatcher task
#[derive(Clone)]
pub struct ControllerHandle {
    tx: mpsc::Sender<Command>,
}

impl ControllerHandle {
    /// Move `controller` into a new dispatcher task
    ///
    /// The task ends once every handle has been dropped.
    pub fn spawn(controller: TagPresenceController) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let task = tokio::spawn(run(controller, rx));
        (Self { tx }, task)
    }

    /// Queue a sensor state change without waiting for it to be handled
    pub async fn sensor_changed(&self, event: SensorEvent) -> Result<()> {
        self.tx
            .send(Command::Sensor(event))
            .await
            .map_err(|_| closed())
    }

    pub async fn map_tag(&self, request: MapTagRequest) -> Result<MediaDescriptor> {
        self.request(|reply| Command::MapTag(request, reply)).await?
    }

    pub async fn map_last_tag(&self, request: MapLastTagRequest) -> Result<MediaDescriptor> {
        self.request(|reply| Command::MapLastTag(request, reply)).await?
    }

    pub async fn reload(&self) -> Result<usize> {
        self.request(Command::Reload).await?
    }

    /// Session snapshot taken after every previously queued command
    pub async fn session(&self) -> Result<SessionState> {
        self.request(Command::Session).await
    }

    pub async fn mappings(&self) -> Result<BTreeMap<String, MappingRecord>> {
        self.request(Command::Mappings).await
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(command(reply)).await.map_err(|_| closed())?;
        rx.await
            .map_err(|_| Error::Internal("dispatcher dropped the request".to_string()))
    }
}

fn closed() -> Error {
    Error::Internal("dispatcher stopped".to_string())
}

async fn run(mut controller: TagPresenceController, mut rx: mpsc::Receiver<Command>) {
    info!("Dispatcher started");

    while let Some(command) = rx.recv().await {
        match command {
            Command::Sensor(event) => controller.handle_sensor_event(event).await,
            Command::MapTag(request, reply) => {
                respond(reply, controller.map_tag(request));
            }
            Command::MapLastTag(request, reply) => {
                respond(reply, controller.map_last_tag(request));
            }
            Command::Reload(reply) => {
                let result = controller.reload_mappings().await;
                respond(reply, result);
            }
            Command::Session(reply) => respond(reply, controller.session()),
            Command::Mappings(reply) => respond(reply, controller.mappings()),
        }
    }

    info!("Dispatcher stopped");
}

fn respond<T>(reply: oneshot::Sender<T>, value: T) {
    if reply.send(value).is_err() {
        debug!("Requester went away before the reply was ready");
    }
}
