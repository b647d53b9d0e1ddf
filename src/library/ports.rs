//! Collaborator interfaces
//!
//! The subtitle endpoints only ever talk to the catalog, the encoder and
//! remote providers through these traits, so each can be swapped for a
//! fake in tests.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::sync::Arc;
use uuid::Uuid;

use super::types::{
    Item, MediaSource, RemoteSubtitle, RemoteSubtitleInfo, SubtitleSearchRequest,
    SubtitleStreamRef, UploadSubtitleDto,
};
use crate::error::Result;

/// A response body produced incrementally.
pub type ByteStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Item lookup.
pub trait ItemRepository: Send + Sync {
    fn get_item_by_id(&self, id: Uuid) -> Option<Arc<Item>>;
}

/// Media source lookup.
#[async_trait]
pub trait MediaSourceProvider: Send + Sync {
    /// Media sources known without probing.
    fn get_static_media_sources(&self, item: &Item) -> Vec<MediaSource>;

    /// Resolve one media source by id.
    async fn get_media_source(&self, item: &Item, media_source_id: &str) -> Result<MediaSource>;
}

/// Search, download, delete, upload and raw fetch of subtitles.
#[async_trait]
pub trait SubtitleManager: Send + Sync {
    async fn search_subtitles(
        &self,
        item: &Item,
        language: &str,
        is_perfect_match: bool,
    ) -> Result<Vec<RemoteSubtitleInfo>>;

    async fn download_subtitles(&self, item: &Item, subtitle_id: &str) -> Result<()>;

    async fn delete_subtitles(&self, item: &Item, index: i32) -> Result<()>;

    async fn get_remote_subtitles(&self, id: &str) -> Result<RemoteSubtitle>;

    async fn upload_subtitle(&self, item: &Item, upload: UploadSubtitleDto) -> Result<()>;
}

/// Parameters of one encoder invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeRequest {
    pub stream: SubtitleStreamRef,
    /// Normalized output format token
    pub format: String,
    pub start_ticks: i64,
    /// `0` when the caller gave no end position
    pub end_ticks: i64,
    pub copy_timestamps: bool,
}

/// Subtitle conversion.
#[async_trait]
pub trait SubtitleEncoder: Send + Sync {
    async fn get_subtitles(&self, item: &Item, request: &EncodeRequest) -> Result<ByteStream>;
}

/// A remote subtitle source (search + fetch).
#[async_trait]
pub trait RemoteSubtitleProvider: Send + Sync {
    /// Short identifier, used as the prefix of subtitle ids.
    fn name(&self) -> &str;

    async fn search(&self, request: &SubtitleSearchRequest) -> Result<Vec<RemoteSubtitleInfo>>;

    /// Fetch by the provider's own id (without the `<provider>_` prefix).
    async fn fetch(&self, id: &str) -> Result<RemoteSubtitle>;
}
