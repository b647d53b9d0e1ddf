//! Subtitle delivery
//!
//! Picks a delivery mode for each request and produces the response body:
//! the source file as-is, the encoder's output, or encoder output with a
//! timestamp map injected. Playlists are rendered from the media runtime.

use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use std::future::Future;
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::format::{content_type_for_format, content_type_for_path, normalize_format, resolve, DeliveryMode};
use super::timestamp_map::map_to_absolute;
use crate::error::{Result, SubtitleError};
use crate::library::{
    ByteStream, EncodeRequest, Item, ItemRepository, MediaSourceProvider, SubtitleEncoder,
    SubtitleStreamRef,
};
use crate::playlist::{generate_subtitle_playlist, SegmentPlan};
use crate::ticks::seconds_to_ticks;

/// A request for subtitle content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleRequest {
    pub stream: SubtitleStreamRef,
    /// Requested format token; empty for the source file
    pub format: String,
    pub start_position_ticks: i64,
    pub end_position_ticks: Option<i64>,
    pub copy_timestamps: bool,
    pub add_vtt_time_map: bool,
}

/// A request for a segmented subtitle playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistRequest {
    pub stream: SubtitleStreamRef,
    /// Segment length in seconds
    pub segment_length: i64,
}

/// Response payload.
pub enum SubtitleBody {
    Full(Bytes),
    Stream(ByteStream),
}

impl std::fmt::Debug for SubtitleBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubtitleBody::Full(bytes) => write!(f, "Full({} bytes)", bytes.len()),
            SubtitleBody::Stream(_) => f.write_str("Stream"),
        }
    }
}

/// Subtitle content with its MIME type.
#[derive(Debug)]
pub struct SubtitleContent {
    pub content_type: &'static str,
    pub body: SubtitleBody,
}

impl SubtitleContent {
    /// Read the whole body into memory.
    pub async fn into_bytes(self) -> Result<Bytes> {
        match self.body {
            SubtitleBody::Full(bytes) => Ok(bytes),
            SubtitleBody::Stream(stream) => collect(stream).await,
        }
    }
}

async fn collect(stream: ByteStream) -> Result<Bytes> {
    let chunks: Vec<Bytes> = stream.try_collect().await?;
    Ok(chunks.concat().into())
}

/// Run `fut` unless `cancel` fires first.
async fn cancellable<T>(cancel: &CancellationToken, fut: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SubtitleError::Cancelled),
        result = fut => result,
    }
}

/// Orchestrates subtitle requests over the injected collaborators.
pub struct SubtitleDispatcher {
    items: Arc<dyn ItemRepository>,
    sources: Arc<dyn MediaSourceProvider>,
    encoder: Arc<dyn SubtitleEncoder>,
}

impl SubtitleDispatcher {
    pub fn new(
        items: Arc<dyn ItemRepository>,
        sources: Arc<dyn MediaSourceProvider>,
        encoder: Arc<dyn SubtitleEncoder>,
    ) -> Self {
        Self {
            items,
            sources,
            encoder,
        }
    }

    fn item(&self, id: Uuid) -> Result<Arc<Item>> {
        self.items
            .get_item_by_id(id)
            .ok_or_else(|| SubtitleError::not_found(format!("item {}", id)))
    }

    /// Render the HLS playlist for one subtitle stream.
    pub async fn get_subtitle_playlist(
        &self,
        request: &PlaylistRequest,
        access_token: &str,
    ) -> Result<String> {
        let item = self.item(request.stream.item_id)?;
        let source = self
            .sources
            .get_media_source(&item, &request.stream.media_source_id)
            .await?;

        let runtime_ticks = source.run_time_ticks.unwrap_or(-1);
        let segment_length_ticks = seconds_to_ticks(request.segment_length).unwrap_or(-1);
        let plan = SegmentPlan::new(runtime_ticks, segment_length_ticks)?;

        tracing::debug!(
            item_id = %item.id,
            index = request.stream.stream_index,
            segments = plan.segment_count(),
            "Rendering subtitle playlist"
        );

        Ok(generate_subtitle_playlist(&plan, access_token))
    }

    /// Produce subtitle content. Encoder work stops with `Cancelled` once
    /// `cancel` fires.
    pub async fn get_subtitles(
        &self,
        request: &SubtitleRequest,
        cancel: &CancellationToken,
    ) -> Result<SubtitleContent> {
        if request.start_position_ticks < 0 {
            return Err(SubtitleError::validation("startPositionTicks must not be negative"));
        }
        if request.end_position_ticks.is_some_and(|end| end < 0) {
            return Err(SubtitleError::validation("endPositionTicks must not be negative"));
        }

        let item = self.item(request.stream.item_id)?;
        let mode = resolve(&request.format, request.add_vtt_time_map);

        tracing::debug!(
            item_id = %item.id,
            index = request.stream.stream_index,
            format = %request.format,
            ?mode,
            "Delivering subtitles"
        );

        match mode {
            DeliveryMode::RawPassthrough => self.passthrough(&item, &request.stream).await,
            DeliveryMode::DirectTranscode => {
                let format = normalize_format(&request.format);
                let stream = self.encode(&item, request, &format, cancel).await?;
                Ok(SubtitleContent {
                    content_type: content_type_for_format(&format),
                    body: SubtitleBody::Stream(stream),
                })
            }
            DeliveryMode::TimestampMappedVtt => {
                let stream = self.encode(&item, request, "vtt", cancel).await?;
                let bytes = cancellable(cancel, collect(stream)).await?;
                let text = map_to_absolute(&String::from_utf8_lossy(&bytes));
                Ok(SubtitleContent {
                    content_type: content_type_for_format("vtt"),
                    body: SubtitleBody::Full(Bytes::from(text)),
                })
            }
        }
    }

    async fn passthrough(&self, item: &Item, stream: &SubtitleStreamRef) -> Result<SubtitleContent> {
        let source = self
            .sources
            .get_static_media_sources(item)
            .into_iter()
            .find(|s| s.id.eq_ignore_ascii_case(&stream.media_source_id))
            .ok_or_else(|| {
                SubtitleError::not_found(format!("media source {}", stream.media_source_id))
            })?;

        let path = source
            .subtitle_stream(stream.stream_index)
            .and_then(|s| s.path.clone())
            .ok_or_else(|| {
                SubtitleError::not_found(format!(
                    "subtitle file for stream {} of item {}",
                    stream.stream_index, item.id
                ))
            })?;

        let file = tokio::fs::File::open(&path).await?;
        Ok(SubtitleContent {
            content_type: content_type_for_path(&path),
            body: SubtitleBody::Stream(ReaderStream::new(file).boxed()),
        })
    }

    async fn encode(
        &self,
        item: &Item,
        request: &SubtitleRequest,
        format: &str,
        cancel: &CancellationToken,
    ) -> Result<ByteStream> {
        let encode = EncodeRequest {
            stream: request.stream.clone(),
            format: format.to_string(),
            start_ticks: request.start_position_ticks,
            end_ticks: request.end_position_ticks.unwrap_or(0),
            copy_timestamps: request.copy_timestamps,
        };
        cancellable(cancel, self.encoder.get_subtitles(item, &encode)).await
    }
}
