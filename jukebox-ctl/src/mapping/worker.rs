//! Storage worker
//!
//! All mapping file I/O runs here, off the dispatcher. Requests are processed
//! strictly in submission order, one blocking task at a time, so a later save
//! can never be overwritten by an earlier one.

use super::{MappingStore, MappingTable};
use crate::error::{Error, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

enum StorageRequest {
    /// Persist a snapshot of the table (fire and forget)
    Save(MappingTable),
    /// Read the persisted table
    Load(oneshot::Sender<MappingTable>),
    /// Reply once every earlier request has completed
    Flush(oneshot::Sender<()>),
}

/// Handle to the storage worker task
#[derive(Clone)]
pub struct StorageHandle {
    tx: mpsc::UnboundedSender<StorageRequest>,
}

impl StorageHandle {
    /// Spawn the worker on the current runtime
    pub fn spawn(store: Arc<dyn MappingStore>) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(store, rx));
        (Self { tx }, task)
    }

    /// Queue a save of `table`
    ///
    /// Returns immediately. The table is durable once the worker has
    /// processed the request; failures are logged by the worker.
    pub fn save(&self, table: MappingTable) {
        if self.tx.send(StorageRequest::Save(table)).is_err() {
            error!("Storage worker stopped; mapping change was not persisted");
        }
    }

    /// Read the persisted table (after all queued saves)
    pub async fn load(&self) -> Result<MappingTable> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(StorageRequest::Load(reply))
            .map_err(|_| Error::Internal("storage worker stopped".to_string()))?;
        rx.await
            .map_err(|_| Error::Internal("storage worker dropped load request".to_string()))
    }

    /// Wait until every previously queued request has completed
    pub async fn flush(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(StorageRequest::Flush(reply))
            .map_err(|_| Error::Internal("storage worker stopped".to_string()))?;
        rx.await
            .map_err(|_| Error::Internal("storage worker dropped flush request".to_string()))
    }
}

async fn run(store: Arc<dyn MappingStore>, mut rx: mpsc::UnboundedReceiver<StorageRequest>) {
    debug!("Storage worker started");

    while let Some(request) = rx.recv().await {
        match request {
            StorageRequest::Save(table) => {
                let store = Arc::clone(&store);
                match tokio::task::spawn_blocking(move || store.save(&table)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => error!("Error saving mapping file: {}", err),
                    Err(err) => error!("Mapping save task failed: {}", err),
                }
            }
            StorageRequest::Load(reply) => {
                let store = Arc::clone(&store);
                let table = match tokio::task::spawn_blocking(move || store.load()).await {
                    Ok(table) => table,
                    Err(err) => {
                        error!("Mapping load task failed: {}", err);
                        MappingTable::new()
                    }
                };
                if reply.send(table).is_err() {
                    warn!("Mapping load requester went away");
                }
            }
            StorageRequest::Flush(reply) => {
                let _ = reply.send(());
            }
        }
    }

    debug!("Storage worker stopped");
}
