//! Test fixtures for integration tests
//!
//! In-memory stand-ins for the catalog, the encoder and the refresh
//! scheduler, plus a router wired to them.

use async_trait::async_trait;
use axum::Router;
use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::auth::HeaderAuthContext;
use crate::config::ServerConfig;
use crate::error::{Result, SubtitleError};
use crate::http::create_router;
use crate::library::{
    ByteStream, EncodeRequest, Item, ItemRepository, MediaSource, MediaSourceProvider,
    MediaStream, MediaStreamType, RemoteSubtitle, RemoteSubtitleInfo, SubtitleEncoder,
    SubtitleManager, UploadSubtitleDto,
};
use crate::refresh::{RefreshOptions, RefreshPriority, RefreshScheduler};
use crate::state::{AppState, Services};

/// Index of the embedded subtitle stream in `sample_item`
pub const EMBEDDED_SUBTITLE: i32 = 2;
/// Index of the external subtitle stream, when present
pub const EXTERNAL_SUBTITLE: i32 = 3;

fn stream(index: i32, stream_type: MediaStreamType, codec: &str) -> MediaStream {
    MediaStream {
        index,
        stream_type,
        codec: Some(codec.to_string()),
        language: Some("eng".to_string()),
        title: None,
        is_external: false,
        is_forced: false,
        is_default: index == 0,
        path: None,
    }
}

/// A movie with video, audio and one embedded subtitle stream, plus an
/// external subtitle at `sidecar` when given.
pub fn sample_item(run_time_ticks: Option<i64>, sidecar: Option<PathBuf>) -> Item {
    let path = sidecar
        .as_deref()
        .and_then(|p| p.parent())
        .map(|dir| dir.join("Movie.mkv"))
        .unwrap_or_else(|| PathBuf::from("/media/Movie.mkv"));
    let id = Item::id_for_path(&path);

    let mut media_streams = vec![
        stream(0, MediaStreamType::Video, "h264"),
        stream(1, MediaStreamType::Audio, "aac"),
        stream(EMBEDDED_SUBTITLE, MediaStreamType::Subtitle, "subrip"),
    ];
    if let Some(sidecar) = sidecar {
        media_streams.push(MediaStream {
            is_external: true,
            path: Some(sidecar),
            ..stream(EXTERNAL_SUBTITLE, MediaStreamType::Subtitle, "srt")
        });
    }

    Item {
        id,
        name: "Movie".to_string(),
        path: path.clone(),
        media_sources: vec![MediaSource {
            id: Item::media_source_id(id),
            path,
            run_time_ticks,
            media_streams,
        }],
    }
}

pub const SAMPLE_SRT: &str = "1\n00:00:01,000 --> 00:00:02,000\nHello\n";

/// Remote result offered by `MemoryCatalog` searches.
pub fn sample_remote_info(language: &str) -> RemoteSubtitleInfo {
    RemoteSubtitleInfo {
        three_letter_iso_language_name: Some(language.to_string()),
        id: "mock_1".to_string(),
        provider_name: "mock".to_string(),
        name: Some("Movie.2020.srt".to_string()),
        format: Some("srt".to_string()),
        author: None,
        comment: None,
        date_created: None,
        community_rating: Some(7.5),
        download_count: Some(42),
        is_hash_match: Some(true),
    }
}

/// Catalog and subtitle manager over an in-memory map, recording calls.
#[derive(Default)]
pub struct MemoryCatalog {
    items: DashMap<Uuid, Arc<Item>>,
    fail_downloads: bool,
    pub downloads: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<(Uuid, i32)>>,
    pub uploads: Mutex<Vec<UploadSubtitleDto>>,
}

impl MemoryCatalog {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_item(item: Item) -> Arc<Self> {
        let catalog = Self::default();
        catalog.items.insert(item.id, Arc::new(item));
        Arc::new(catalog)
    }

    pub fn with_failing_downloads(item: Item) -> Arc<Self> {
        let catalog = Self {
            fail_downloads: true,
            ..Self::default()
        };
        catalog.items.insert(item.id, Arc::new(item));
        Arc::new(catalog)
    }
}

impl ItemRepository for MemoryCatalog {
    fn get_item_by_id(&self, id: Uuid) -> Option<Arc<Item>> {
        self.items.get(&id).map(|e| Arc::clone(e.value()))
    }
}

#[async_trait]
impl MediaSourceProvider for MemoryCatalog {
    fn get_static_media_sources(&self, item: &Item) -> Vec<MediaSource> {
        item.media_sources.clone()
    }

    async fn get_media_source(&self, item: &Item, media_source_id: &str) -> Result<MediaSource> {
        item.media_sources
            .iter()
            .find(|s| s.id.eq_ignore_ascii_case(media_source_id))
            .cloned()
            .ok_or_else(|| SubtitleError::not_found(format!("media source {}", media_source_id)))
    }
}

#[async_trait]
impl SubtitleManager for MemoryCatalog {
    async fn search_subtitles(
        &self,
        _item: &Item,
        language: &str,
        _is_perfect_match: bool,
    ) -> Result<Vec<RemoteSubtitleInfo>> {
        Ok(vec![sample_remote_info(language)])
    }

    async fn download_subtitles(&self, _item: &Item, subtitle_id: &str) -> Result<()> {
        self.downloads.lock().push(subtitle_id.to_string());
        if self.fail_downloads {
            return Err(SubtitleError::Upstream("provider unavailable".to_string()));
        }
        Ok(())
    }

    async fn delete_subtitles(&self, item: &Item, index: i32) -> Result<()> {
        let external = item
            .media_sources
            .iter()
            .filter_map(|s| s.subtitle_stream(index))
            .any(|s| s.is_external);
        if !external {
            return Err(SubtitleError::not_found(format!("external subtitle {}", index)));
        }
        self.deleted.lock().push((item.id, index));
        Ok(())
    }

    async fn get_remote_subtitles(&self, id: &str) -> Result<RemoteSubtitle> {
        if id != "mock_1" {
            return Err(SubtitleError::not_found(id));
        }
        Ok(RemoteSubtitle {
            format: "srt".to_string(),
            language: Some("eng".to_string()),
            data: Bytes::from_static(SAMPLE_SRT.as_bytes()),
        })
    }

    async fn upload_subtitle(&self, _item: &Item, upload: UploadSubtitleDto) -> Result<()> {
        if upload.format != "srt" && upload.format != "vtt" {
            return Err(SubtitleError::validation("unsupported subtitle format"));
        }
        self.uploads.lock().push(upload);
        Ok(())
    }
}

/// Encoder returning fixed text and recording every request.
pub struct FakeEncoder {
    output: String,
    delay: Option<Duration>,
    fail: bool,
    calls: Mutex<Vec<EncodeRequest>>,
}

impl FakeEncoder {
    pub fn new(output: &str) -> Arc<Self> {
        Arc::new(Self {
            output: output.to_string(),
            delay: None,
            fail: false,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn delayed(output: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            output: output.to_string(),
            delay: Some(delay),
            fail: false,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            output: String::new(),
            delay: None,
            fail: true,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<EncodeRequest> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl SubtitleEncoder for FakeEncoder {
    async fn get_subtitles(&self, _item: &Item, request: &EncodeRequest) -> Result<ByteStream> {
        self.calls.lock().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(SubtitleError::Encoding("ffmpeg exited with 1".to_string()));
        }
        let body = Bytes::from(self.output.clone());
        Ok(Box::pin(futures::stream::once(async move {
            Ok::<_, std::io::Error>(body)
        })))
    }
}

/// Scheduler that only records what was queued.
#[derive(Default)]
pub struct RecordingScheduler {
    pub queued: Mutex<Vec<(Uuid, RefreshPriority)>>,
}

impl RefreshScheduler for RecordingScheduler {
    fn queue_refresh(&self, item_id: Uuid, _options: RefreshOptions, priority: RefreshPriority) {
        self.queued.lock().push((item_id, priority));
    }
}

/// A router wired to fakes, with handles to inspect them.
pub struct TestApp {
    pub router: Router,
    pub catalog: Arc<MemoryCatalog>,
    pub encoder: Arc<FakeEncoder>,
    pub refresh: Arc<RecordingScheduler>,
    pub shutdown: CancellationToken,
}

impl TestApp {
    pub fn new(catalog: Arc<MemoryCatalog>, encoder: Arc<FakeEncoder>) -> Self {
        let refresh = Arc::new(RecordingScheduler::default());
        let shutdown = CancellationToken::new();
        let services = Services {
            items: catalog.clone(),
            sources: catalog.clone(),
            subtitles: catalog.clone(),
            encoder: encoder.clone(),
            auth: Arc::new(HeaderAuthContext),
            refresh: refresh.clone(),
        };
        let state = Arc::new(AppState::new(ServerConfig::default(), services, shutdown.clone()));

        Self {
            router: create_router(state),
            catalog,
            encoder,
            refresh,
            shutdown,
        }
    }
}
