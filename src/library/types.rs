//! Catalog types shared between the library, the encoder and the HTTP layer.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Kind of elementary stream inside a media source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaStreamType {
    Video,
    Audio,
    Subtitle,
    Other,
}

/// One stream of a media source. External subtitle files are modelled as
/// streams too, with `is_external` set and `path` pointing at the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MediaStream {
    pub index: i32,
    #[serde(rename = "Type")]
    pub stream_type: MediaStreamType,
    pub codec: Option<String>,
    pub language: Option<String>,
    pub title: Option<String>,
    pub is_external: bool,
    pub is_forced: bool,
    pub is_default: bool,
    pub path: Option<PathBuf>,
}

impl MediaStream {
    pub fn is_subtitle(&self) -> bool {
        self.stream_type == MediaStreamType::Subtitle
    }
}

/// A playable version of an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MediaSource {
    pub id: String,
    pub path: PathBuf,
    /// Total runtime; `None` when the container does not report one.
    pub run_time_ticks: Option<i64>,
    pub media_streams: Vec<MediaStream>,
}

impl MediaSource {
    /// Find the subtitle stream with the given index.
    pub fn subtitle_stream(&self, index: i32) -> Option<&MediaStream> {
        self.media_streams
            .iter()
            .find(|s| s.is_subtitle() && s.index == index)
    }

    /// All subtitle streams, embedded and external.
    pub fn subtitle_streams(&self) -> impl Iterator<Item = &MediaStream> {
        self.media_streams.iter().filter(|s| s.is_subtitle())
    }
}

/// A video item in the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub path: PathBuf,
    pub media_sources: Vec<MediaSource>,
}

impl Item {
    /// Stable item id for a media path.
    pub fn id_for_path(path: &Path) -> Uuid {
        Uuid::new_v5(&Uuid::NAMESPACE_URL, path.to_string_lossy().as_bytes())
    }

    /// Media source id used for an item's primary source.
    pub fn media_source_id(id: Uuid) -> String {
        id.simple().to_string()
    }
}

/// Addresses one subtitle track of one media source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleStreamRef {
    pub item_id: Uuid,
    pub media_source_id: String,
    pub stream_index: i32,
}

/// A subtitle candidate offered by a remote provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RemoteSubtitleInfo {
    #[serde(rename = "ThreeLetterISOLanguageName")]
    pub three_letter_iso_language_name: Option<String>,
    /// `<provider>_<provider subtitle id>`
    pub id: String,
    pub provider_name: String,
    pub name: Option<String>,
    pub format: Option<String>,
    pub author: Option<String>,
    pub comment: Option<String>,
    pub date_created: Option<DateTime<Utc>>,
    pub community_rating: Option<f32>,
    pub download_count: Option<u32>,
    pub is_hash_match: Option<bool>,
}

/// Subtitle content fetched from a remote provider.
#[derive(Debug, Clone)]
pub struct RemoteSubtitle {
    pub format: String,
    pub language: Option<String>,
    pub data: Bytes,
}

/// Criteria sent to remote subtitle providers.
#[derive(Debug, Clone)]
pub struct SubtitleSearchRequest {
    pub item_id: Uuid,
    pub name: String,
    pub media_path: PathBuf,
    pub language: String,
    pub runtime_ticks: Option<i64>,
    pub is_perfect_match: bool,
}

/// A subtitle file uploaded by a client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UploadSubtitleDto {
    pub language: String,
    pub format: String,
    #[serde(default)]
    pub is_forced: bool,
    #[serde(default)]
    pub is_hearing_impaired: bool,
    /// Base64-encoded file contents
    pub data: String,
}
