//! HTTP request handlers

use super::AppContext;
use crate::controller::{MapLastTagRequest, MapTagRequest, SensorEvent};
use crate::error::Error;
use crate::state::SessionState;
use axum::{extract::State, http::StatusCode, Json};
use jukebox_common::{MappingRecord, MediaDescriptor};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, error};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

#[derive(Debug, Serialize)]
pub struct MapTagResponse {
    status: String,
    tag_id: String,
    media: MediaDescriptor,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    status: String,
    count: usize,
}

type ApiError = (StatusCode, Json<StatusResponse>);

/// Rejected mapping requests are the caller's fault; anything else means the
/// dispatcher is gone
fn api_error(err: Error) -> ApiError {
    let status = match &err {
        Error::InvalidMappingRequest(_) => StatusCode::BAD_REQUEST,
        _ => {
            error!("Request failed: {}", err);
            StatusCode::SERVICE_UNAVAILABLE
        }
    };
    (
        status,
        Json(StatusResponse {
            status: format!("error: {}", err),
        }),
    )
}

fn ok() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

// ============================================================================
// Health Endpoint
// ============================================================================

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        module: "jukebox-ctl".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Sensor Webhook
// ============================================================================

/// POST /api/v1/sensor - tag sensor state change
///
/// Queued for the dispatcher; the response does not wait for playback.
pub async fn sensor_changed(
    State(ctx): State<AppContext>,
    Json(event): Json<SensorEvent>,
) -> Result<(StatusCode, Json<StatusResponse>), ApiError> {
    debug!("Sensor event received: {:?}", event);
    ctx.controller
        .sensor_changed(event)
        .await
        .map_err(api_error)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(StatusResponse {
            status: "accepted".to_string(),
        }),
    ))
}

// ============================================================================
// Read-only Views
// ============================================================================

/// GET /api/v1/session
pub async fn get_session(State(ctx): State<AppContext>) -> Result<Json<SessionState>, ApiError> {
    ctx.controller.session().await.map(Json).map_err(api_error)
}

/// GET /api/v1/mappings - full table as structured records
pub async fn get_mappings(
    State(ctx): State<AppContext>,
) -> Result<Json<BTreeMap<String, MappingRecord>>, ApiError> {
    ctx.controller.mappings().await.map(Json).map_err(api_error)
}

// ============================================================================
// Mapping Requests
// ============================================================================

/// POST /api/v1/mappings - `{tag_id, media_type?, media_name, alias?}`
pub async fn map_tag(
    State(ctx): State<AppContext>,
    Json(request): Json<MapTagRequest>,
) -> Result<Json<MapTagResponse>, ApiError> {
    let tag_id = request.tag_id.clone().unwrap_or_default();
    let media = ctx.controller.map_tag(request).await.map_err(api_error)?;

    Ok(Json(MapTagResponse {
        status: "ok".to_string(),
        tag_id,
        media,
    }))
}

/// POST /api/v1/mappings/last - map the most recently scanned tag
pub async fn map_last_tag(
    State(ctx): State<AppContext>,
    Json(request): Json<MapLastTagRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    ctx.controller
        .map_last_tag(request)
        .await
        .map_err(api_error)?;
    Ok(ok())
}

/// POST /api/v1/mappings/reload
pub async fn reload_mappings(
    State(ctx): State<AppContext>,
) -> Result<Json<ReloadResponse>, ApiError> {
    let count = ctx.controller.reload().await.map_err(api_error)?;
    Ok(Json(ReloadResponse {
        status: "ok".to_string(),
        count,
    }))
}
