//! HTTP API for jukebox-ctl
//!
//! Sensor webhook, mapping requests, read-only views and the SSE event stream.
//! Handlers never touch controller state directly; everything goes through the
//! dispatcher handle.

pub mod handlers;
pub mod sse;

use crate::controller::ControllerHandle;
use crate::error::{Error, Result};
use axum::{
    routing::{get, post},
    Router,
};
use jukebox_common::events::EventBus;
use std::future::Future;
use std::net::SocketAddr;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub controller: ControllerHandle,
    pub events: EventBus,
    /// Flips to true when the server starts shutting down; ends SSE streams
    pub shutdown: watch::Receiver<bool>,
}

impl AppContext {
    /// Context whose SSE streams end once `true` is sent on the returned sender
    pub fn new(controller: ControllerHandle, events: EventBus) -> (Self, watch::Sender<bool>) {
        let (tx, shutdown) = watch::channel(false);
        (
            Self {
                controller,
                events,
                shutdown,
            },
            tx,
        )
    }
}

/// Create the API router
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .nest(
            "/api/v1",
            Router::new()
                .route("/sensor", post(handlers::sensor_changed))
                .route("/session", get(handlers::get_session))
                .route(
                    "/mappings",
                    get(handlers::get_mappings).post(handlers::map_tag),
                )
                .route("/mappings/last", post(handlers::map_last_tag))
                .route("/mappings/reload", post(handlers::reload_mappings))
                .route("/events", get(sse::event_stream)),
        )
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve the API until `shutdown` resolves
pub async fn run(
    port: u16,
    ctx: AppContext,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = create_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    Ok(())
}
