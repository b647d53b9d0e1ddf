//! File scanner - opens media files and builds catalog items

use std::path::{Path, PathBuf};

use ffmpeg_next as ffmpeg;
use walkdir::WalkDir;

use crate::error::{Result, SubtitleError};
use crate::library::{Item, MediaSource, MediaStream, MediaStreamType};
use crate::ticks::microseconds_to_ticks;

use super::{analyze_subtitle_stream, find_external_subtitles};

/// File extensions treated as videos when walking a media directory.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "m4v", "mkv", "mov", "webm", "avi", "ts"];

/// Whether `path` looks like a video file
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| VIDEO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Scan a media file and build its catalog item
pub fn scan_file<P: AsRef<Path>>(path: P) -> Result<Item> {
    let path = path.as_ref().to_path_buf();

    // Initialize FFmpeg if not already done
    ffmpeg::init()?;

    let context = ffmpeg::format::input(&path).map_err(|e| {
        SubtitleError::Internal(format!("Failed to open {}: {}", path.display(), e))
    })?;

    // AV_TIME_BASE is microseconds; non-positive means unknown
    let run_time_ticks = microseconds_to_ticks(context.duration());

    let mut media_streams = Vec::new();
    for stream in context.streams() {
        let info = analyze_stream(&stream);
        tracing::debug!(
            "Found stream {}: type={:?}, codec={:?}, language={:?}",
            info.index,
            info.stream_type,
            info.codec,
            info.language
        );
        media_streams.push(info);
    }

    let next_index = media_streams.len() as i32;
    media_streams.extend(find_external_subtitles(&path, next_index));

    let id = Item::id_for_path(&path);
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let source = MediaSource {
        id: Item::media_source_id(id),
        path: path.clone(),
        run_time_ticks,
        media_streams,
    };

    tracing::info!(
        "Indexed file: {:?}, runtime_ticks={:?}, streams={}, subtitles={}",
        path,
        run_time_ticks,
        source.media_streams.len(),
        source.subtitle_streams().count()
    );

    Ok(Item {
        id,
        name,
        path,
        media_sources: vec![source],
    })
}

fn analyze_stream(stream: &ffmpeg::Stream) -> MediaStream {
    let stream_type = match stream.parameters().medium() {
        ffmpeg::media::Type::Subtitle => return analyze_subtitle_stream(stream),
        ffmpeg::media::Type::Video => MediaStreamType::Video,
        ffmpeg::media::Type::Audio => MediaStreamType::Audio,
        _ => MediaStreamType::Other,
    };

    MediaStream {
        index: stream.index() as i32,
        stream_type,
        codec: Some(stream.parameters().id().name().to_string()),
        language: super::subtitle::get_stream_language(stream),
        title: None,
        is_external: false,
        is_forced: false,
        is_default: stream
            .disposition()
            .contains(ffmpeg::format::stream::Disposition::DEFAULT),
        path: None,
    }
}

/// Collect every video file under the given directories.
pub fn find_video_files(dirs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = dirs
        .iter()
        .flat_map(|dir| {
            WalkDir::new(dir)
                .follow_links(true)
                .into_iter()
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        tracing::warn!("Skipping unreadable entry under {}: {}", dir.display(), e);
                        None
                    }
                })
        })
        .filter(|entry| entry.file_type().is_file() && is_video_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

/// Scan every video under the given directories. Files that fail to open
/// are logged and skipped.
pub fn scan_dirs(dirs: &[PathBuf]) -> Vec<Item> {
    find_video_files(dirs)
        .into_iter()
        .filter_map(|path| match scan_file(&path) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!("Failed to index {:?}: {}", path, e);
                None
            }
        })
        .collect()
}
