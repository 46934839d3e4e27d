//! Player sessions over HTTP.
//!
//! The TV device opens a session per stream, drains the engine commands it
//! should apply to its local player, posts back the engine's notifications
//! and forwards remote key presses as commands. Snapshots can be polled or
//! followed over SSE.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::{wrappers::WatchStream, Stream, StreamExt};
use uuid::Uuid;

use super::{api_error, require_login, ApiError};
use crate::services::player::{
    EngineCommand, EngineEvent, PlaybackSnapshot, PlayerCommand, PlayerError, StreamTarget,
};
use crate::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub device_id: String,
    /// Explicit URL; otherwise built from `stream_id` and the stored login
    pub stream_url: Option<String>,
    pub stream_id: Option<i64>,
    /// Look the channel up in this category's cached list
    pub category_id: Option<String>,
    pub channel_name: Option<String>,
    pub channel_number: Option<i32>,
    pub extension: Option<String>,
}

#[derive(Deserialize)]
pub struct CommandRequest {
    pub command: PlayerCommand,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub snapshot: PlaybackSnapshot,
}

#[derive(Serialize)]
pub struct EngineCommandsResponse {
    pub commands: Vec<EngineCommand>,
}

#[derive(Serialize)]
pub struct DisposeResponse {
    pub closed: bool,
    pub commands: Vec<EngineCommand>,
}

fn parse_uuid(s: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(s).map_err(|_| api_error(StatusCode::BAD_REQUEST, "Invalid session ID format"))
}

fn player_error(e: PlayerError) -> ApiError {
    let status = match e {
        PlayerError::NotFound => StatusCode::NOT_FOUND,
        PlayerError::TooManySessions(_) => StatusCode::SERVICE_UNAVAILABLE,
        PlayerError::Closed => StatusCode::GONE,
    };
    api_error(status, e.to_string())
}

async fn resolve_target(
    state: &AppState,
    req: &CreateSessionRequest,
) -> Result<StreamTarget, ApiError> {
    if let Some(url) = req.stream_url.as_ref().filter(|u| !u.trim().is_empty()) {
        return Ok(StreamTarget {
            stream_url: url.trim().to_string(),
            channel_name: req.channel_name.clone().unwrap_or_default(),
            channel_number: req.channel_number.unwrap_or(0),
        });
    }

    let stream_id = req
        .stream_id
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "streamId or streamUrl is required"))?;
    let creds = require_login(state)?;
    let extension = req
        .extension
        .as_deref()
        .unwrap_or(&state.config.default_stream_extension);

    let Some(category_id) = req.category_id.as_deref() else {
        return Ok(StreamTarget {
            stream_url: creds.live_url(stream_id, extension),
            channel_name: req.channel_name.clone().unwrap_or_default(),
            channel_number: req.channel_number.unwrap_or(0),
        });
    };

    let channels = state
        .catalog
        .get_channels(&creds, category_id)
        .await
        .map_err(|e| api_error(StatusCode::BAD_GATEWAY, e.to_string()))?;
    let channel = channels
        .iter()
        .find(|c| c.stream_id == stream_id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Channel not found"))?;

    Ok(StreamTarget {
        stream_url: channel.stream_url(&creds, Some(extension)),
        channel_name: channel.name.clone(),
        channel_number: channel.number,
    })
}

/// POST /api/player/sessions
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.device_id.trim().is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "deviceId is required"));
    }

    let target = resolve_target(&state, &req).await?;
    let (id, snapshot) = state
        .players
        .create(&req.device_id, target)
        .await
        .map_err(player_error)?;

    Ok((StatusCode::CREATED, Json(SessionResponse { id, snapshot })))
}

/// GET /api/player/sessions/:id
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_uuid(&id)?;
    let snapshot = state.players.snapshot(id).await.map_err(player_error)?;
    Ok(Json(snapshot))
}

/// GET /api/player/sessions/:id/stream - snapshots as server-sent events
pub async fn stream_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let id = parse_uuid(&id)?;
    let rx = state.players.subscribe(id).await.map_err(player_error)?;

    let stream = WatchStream::new(rx).map(|snapshot| {
        let event = Event::default().event("snapshot");
        Ok::<_, Infallible>(
            event
                .json_data(&snapshot)
                .unwrap_or_else(|_| Event::default().event("snapshot").data("{}")),
        )
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// POST /api/player/sessions/:id/command
pub async fn send_command(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<CommandRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_uuid(&id)?;
    let snapshot = state
        .players
        .command(id, req.command)
        .await
        .map_err(player_error)?;
    Ok(Json(snapshot))
}

/// POST /api/player/sessions/:id/events
pub async fn post_engine_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(event): Json<EngineEvent>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_uuid(&id)?;
    let snapshot = state
        .players
        .engine_event(id, event)
        .await
        .map_err(player_error)?;
    Ok(Json(snapshot))
}

/// GET /api/player/sessions/:id/engine-commands
pub async fn drain_engine_commands(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_uuid(&id)?;
    let commands = state
        .players
        .drain_engine_commands(id)
        .await
        .map_err(player_error)?;
    Ok(Json(EngineCommandsResponse { commands }))
}

/// DELETE /api/player/sessions/:id
pub async fn dispose_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_uuid(&id)?;
    let commands = state.players.dispose(id).await.map_err(player_error)?;
    Ok(Json(DisposeResponse {
        closed: true,
        commands,
    }))
}
