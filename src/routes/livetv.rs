//! Live TV browsing backed by the catalog cache.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{api_error, require_login, ApiError};
use crate::models::catalog::filter_channels;
use crate::models::{Category, ChannelDetail};
use crate::services::xtream::XtreamError;
use crate::AppState;

// ============================================================================
// Query Parameters
// ============================================================================

#[derive(Deserialize, Default)]
pub struct ChannelsQuery {
    pub q: Option<String>,
}

#[derive(Deserialize)]
pub struct StreamUrlQuery {
    pub stream_id: i64,
    pub extension: Option<String>,
    /// live (default), vod or series
    pub media_type: Option<String>,
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct CategoriesResponse {
    pub total: usize,
    pub categories: Vec<CategoryItem>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryItem {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i32>,
}

impl From<Category> for CategoryItem {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.display_name,
            parent_id: c.parent_id,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelsResponse {
    pub category_id: String,
    pub total: usize,
    pub channels: Vec<ChannelItem>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelItem {
    pub number: i32,
    pub name: String,
    pub stream_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    pub has_archive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_duration_days: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epg_channel_id: Option<String>,
}

impl From<ChannelDetail> for ChannelItem {
    fn from(c: ChannelDetail) -> Self {
        Self {
            number: c.number,
            name: c.name,
            stream_id: c.stream_id,
            logo: c.icon_url,
            category_id: c.category_id,
            has_archive: c.has_archive,
            archive_duration_days: c.archive_duration_days,
            epg_channel_id: c.epg_channel_id,
        }
    }
}

#[derive(Serialize)]
pub struct StreamUrlResponse {
    pub url: String,
}

fn upstream_error(e: XtreamError) -> ApiError {
    tracing::error!("Xtream API error: {}", e);
    api_error(StatusCode::BAD_GATEWAY, e.to_string())
}

fn categories_response(categories: Vec<Category>) -> CategoriesResponse {
    let items: Vec<CategoryItem> = categories.into_iter().map(CategoryItem::from).collect();
    CategoriesResponse {
        total: items.len(),
        categories: items,
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET /api/live/categories
pub async fn get_categories(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let creds = require_login(&state)?;
    let categories = state
        .catalog
        .get_categories(&creds)
        .await
        .map_err(upstream_error)?;

    Ok(Json(categories_response(categories)))
}

/// GET /api/live/categories/:category_id/channels?q=
pub async fn get_channels(
    State(state): State<Arc<AppState>>,
    Path(category_id): Path<String>,
    Query(query): Query<ChannelsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let creds = require_login(&state)?;
    let channels = state
        .catalog
        .get_channels(&creds, &category_id)
        .await
        .map_err(upstream_error)?;

    let channels = match query.q.as_deref() {
        Some(q) => filter_channels(&channels, q),
        None => channels,
    };
    let items: Vec<ChannelItem> = channels.into_iter().map(ChannelItem::from).collect();

    Ok(Json(ChannelsResponse {
        category_id,
        total: items.len(),
        channels: items,
    }))
}

/// POST /api/live/refresh - drop every cached list and reload categories
pub async fn refresh(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let creds = require_login(&state)?;
    state.catalog.clear_cache().await;

    let categories = state
        .catalog
        .get_categories(&creds)
        .await
        .map_err(upstream_error)?;

    Ok(Json(categories_response(categories)))
}

/// GET /api/live/stream-url?stream_id=&extension=&media_type=
pub async fn get_stream_url(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StreamUrlQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let creds = require_login(&state)?;

    let url = match query.media_type.as_deref().unwrap_or("live") {
        "live" => {
            let ext = query
                .extension
                .as_deref()
                .unwrap_or(&state.config.default_stream_extension);
            creds.live_url(query.stream_id, ext)
        }
        "vod" => creds.vod_url(query.stream_id, query.extension.as_deref().unwrap_or("mp4")),
        "series" => creds.series_url(query.stream_id, query.extension.as_deref().unwrap_or("mp4")),
        _ => {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                "Invalid media type. Use: live, vod, or series",
            ))
        }
    };

    Ok(Json(StreamUrlResponse { url }))
}
