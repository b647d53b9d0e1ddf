//! Subtitle endpoints
//!
//! - `DELETE /Videos/{id}/Subtitles/{index}`
//! - `POST /Videos/{id}/Subtitles`
//! - `GET|POST /Items/{id}/RemoteSearch/Subtitles/{language|subtitleId}`
//! - `GET /Providers/Subtitles/Subtitles/{id}`
//! - `GET /Videos/{id}/{mediaSourceId}/Subtitles/{index}/...` for streams and playlists

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::handlers::HttpError;
use super::query::QueryParams;
use crate::library::{RemoteSubtitleInfo, SubtitleStreamRef, UploadSubtitleDto};
use crate::playlist::PLAYLIST_CONTENT_TYPE;
use crate::refresh::{RefreshOptions, RefreshPriority};
use crate::state::AppState;
use crate::subtitle::{PlaylistRequest, SubtitleBody, SubtitleRequest};

/// What the path after `/Subtitles/{index}/` asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubtitleResource {
    /// `subtitles.m3u8`
    Playlist,
    /// `[<startTicks>/]Stream[.<format>]`
    Stream {
        start_position_ticks: Option<i64>,
        format: String,
    },
}

impl SubtitleResource {
    pub fn parse(rest: &str) -> Option<Self> {
        if rest.eq_ignore_ascii_case("subtitles.m3u8") {
            return Some(SubtitleResource::Playlist);
        }

        let caps = regex!(r"(?i)^(?:(\d+)/)?stream(?:\.([a-z0-9]*))?$").captures(rest)?;
        let start_position_ticks = match caps.get(1) {
            Some(m) => Some(m.as_str().parse().ok()?),
            None => None,
        };
        let format = caps
            .get(2)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();

        Some(SubtitleResource::Stream {
            start_position_ticks,
            format,
        })
    }
}

/// Delete an external subtitle
/// DELETE /Videos/{item_id}/Subtitles/{index}
pub async fn delete_subtitle(
    State(state): State<Arc<AppState>>,
    Path((item_id, index)): Path<(Uuid, i32)>,
) -> Result<StatusCode, HttpError> {
    let item = state.get_item(item_id)?;
    state.subtitles.delete_subtitles(&item, index).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Search remote providers
/// GET /Items/{item_id}/RemoteSearch/Subtitles/{language}
pub async fn search_remote_subtitles(
    State(state): State<Arc<AppState>>,
    Path((item_id, language)): Path<(Uuid, String)>,
    query: QueryParams,
) -> Result<Json<Vec<RemoteSubtitleInfo>>, HttpError> {
    let is_perfect_match = query.get_bool("isPerfectMatch")?.unwrap_or(false);
    let item = state.get_item(item_id)?;
    let results = state
        .subtitles
        .search_subtitles(&item, &language, is_perfect_match)
        .await?;
    Ok(Json(results))
}

/// Download a remote subtitle next to the video. Failures are logged only.
/// POST /Items/{item_id}/RemoteSearch/Subtitles/{subtitle_id}
pub async fn download_remote_subtitles(
    State(state): State<Arc<AppState>>,
    Path((item_id, subtitle_id)): Path<(Uuid, String)>,
) -> Result<StatusCode, HttpError> {
    let item = state.get_item(item_id)?;

    match state.subtitles.download_subtitles(&item, &subtitle_id).await {
        Ok(()) => {
            state
                .refresh
                .queue_refresh(item.id, RefreshOptions::full(), RefreshPriority::High);
        }
        Err(e) => {
            tracing::error!(item_id = %item.id, subtitle_id = %subtitle_id, "Error downloading subtitles: {}", e);
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Raw subtitle from a remote provider
/// GET /Providers/Subtitles/Subtitles/{id}
pub async fn get_remote_subtitles(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, HttpError> {
    let subtitle = state.subtitles.get_remote_subtitles(&id).await?;
    let content_type = crate::subtitle::content_type_for_format(&subtitle.format);
    Ok(([(header::CONTENT_TYPE, content_type)], subtitle.data).into_response())
}

/// Upload a subtitle file for an item
/// POST /Videos/{item_id}/Subtitles
pub async fn upload_subtitle(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<Uuid>,
    Json(upload): Json<UploadSubtitleDto>,
) -> Result<StatusCode, HttpError> {
    let item = state.get_item(item_id)?;
    state.subtitles.upload_subtitle(&item, upload).await?;
    state
        .refresh
        .queue_refresh(item.id, RefreshOptions::full(), RefreshPriority::High);
    Ok(StatusCode::NO_CONTENT)
}

/// Subtitle stream or segmented playlist
/// GET /Videos/{item_id}/{media_source_id}/Subtitles/{index}/{*rest}
pub async fn subtitle_resource(
    State(state): State<Arc<AppState>>,
    Path((item_id, media_source_id, index, rest)): Path<(Uuid, String, i32, String)>,
    headers: HeaderMap,
    query: QueryParams,
) -> Result<Response, HttpError> {
    let resource = SubtitleResource::parse(&rest)
        .ok_or_else(|| HttpError::NotFound(format!("Not found: {}", rest)))?;

    let stream = SubtitleStreamRef {
        item_id,
        media_source_id,
        stream_index: index,
    };

    match resource {
        SubtitleResource::Playlist => {
            let request = PlaylistRequest {
                stream,
                segment_length: query.get_i64("segmentLength")?.unwrap_or(0),
            };
            let auth = state.auth.get_authorization_info(&headers, &query);
            let playlist = state
                .dispatcher
                .get_subtitle_playlist(&request, &auth.token)
                .await?;

            let mut headers = HeaderMap::new();
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(PLAYLIST_CONTENT_TYPE));
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
            Ok((headers, playlist).into_response())
        }
        SubtitleResource::Stream {
            start_position_ticks,
            format,
        } => {
            let start_position_ticks = match start_position_ticks {
                Some(ticks) => ticks,
                None => query.get_i64("startPositionTicks")?.unwrap_or(0),
            };
            let request = SubtitleRequest {
                stream,
                format,
                start_position_ticks,
                end_position_ticks: query.get_i64("endPositionTicks")?,
                copy_timestamps: query.get_bool("copyTimestamps")?.unwrap_or(false),
                add_vtt_time_map: query.get_bool("addVttTimeMap")?.unwrap_or(false),
            };

            let cancel = state.request_token();
            let content = state.dispatcher.get_subtitles(&request, &cancel).await?;

            let body = match content.body {
                SubtitleBody::Full(bytes) => Body::from(bytes),
                SubtitleBody::Stream(stream) => Body::from_stream(stream),
            };
            Ok(([(header::CONTENT_TYPE, content.content_type)], body).into_response())
        }
    }
}
