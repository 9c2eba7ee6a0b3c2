//! Server-Sent Events (SSE) broadcaster
//!
//! Streams controller events to connected clients. Each SSE message carries
//! the event name in the `event:` field and the JSON-serialized event as data.

use super::AppContext;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

/// GET /api/v1/events - SSE event stream
pub async fn event_stream(
    State(ctx): State<AppContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = ctx.events.subscribe();
    debug!(
        "New SSE client connected ({} subscribers)",
        ctx.events.subscriber_count()
    );
    let mut shutdown = ctx.shutdown.clone();
    let closing = async move {
        // A dropped sender means nobody will ever shut down
        let signalled = shutdown.wait_for(|closing| *closing).await.map(|_| ());
        if signalled.is_err() {
            std::future::pending::<()>().await;
        }
    };

    let stream = BroadcastStream::new(rx).take_until(closing).filter_map(|result| async move {
        match result {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => {
                    debug!("Broadcasting SSE event: {}", event.event_type());
                    Some(Ok(Event::default().event(event.event_type()).data(json)))
                }
                Err(e) => {
                    warn!("Failed to serialize event: {}", e);
                    None
                }
            },
            Err(e) => {
                // Lagged: the client missed events; keep streaming
                warn!("SSE stream error: {:?}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
