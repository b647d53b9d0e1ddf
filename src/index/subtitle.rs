//! Subtitle stream analysis
//!
//! Embedded subtitle streams come from the container; external ones are
//! sidecar files next to the video named `<stem>[.<lang>][.forced][.sdh].<ext>`.

use std::path::{Path, PathBuf};

use ffmpeg_next as ffmpeg;

use crate::error::{Result, SubtitleError};
use crate::library::{MediaStream, MediaStreamType};

/// Extensions recognised as external subtitle files.
pub const SUBTITLE_EXTENSIONS: &[&str] = &["srt", "vtt", "ass", "ssa", "ttml", "sub"];

/// Tokens in a sidecar name that are flags rather than a language.
const FLAG_TOKENS: &[&str] = &["forced", "sdh", "cc", "hi", "default"];

/// Analyze an embedded subtitle stream
pub fn analyze_subtitle_stream(stream: &ffmpeg::Stream) -> MediaStream {
    let codec_id = stream.parameters().id();
    let disposition = stream.disposition();

    MediaStream {
        index: stream.index() as i32,
        stream_type: MediaStreamType::Subtitle,
        codec: Some(codec_id.name().to_string()),
        language: get_stream_language(stream),
        title: stream.metadata().get("title").map(|s| s.to_string()),
        is_external: false,
        is_forced: disposition.contains(ffmpeg::format::stream::Disposition::FORCED),
        is_default: disposition.contains(ffmpeg::format::stream::Disposition::DEFAULT),
        path: None,
    }
}

/// Extract language from stream metadata
pub fn get_stream_language(stream: &ffmpeg::Stream) -> Option<String> {
    stream
        .metadata()
        .get("language")
        .filter(|l| !l.eq_ignore_ascii_case("und"))
        .map(|s| s.to_string())
}

/// What a sidecar file name says about its contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarName {
    pub language: Option<String>,
    pub is_forced: bool,
    pub format: String,
}

/// Parse `file_name` as a sidecar of a video whose file stem is `stem`.
pub fn parse_sidecar_name(stem: &str, file_name: &str) -> Option<SidecarName> {
    let rest = file_name.strip_prefix(stem)?.strip_prefix('.')?;
    let mut tokens: Vec<&str> = rest.split('.').collect();
    let ext = tokens.pop()?.to_ascii_lowercase();
    if !SUBTITLE_EXTENSIONS.contains(&ext.as_str()) {
        return None;
    }

    let mut language = None;
    let mut is_forced = false;
    for token in tokens {
        let lower = token.to_ascii_lowercase();
        if lower == "forced" {
            is_forced = true;
        } else if language.is_none()
            && !FLAG_TOKENS.contains(&lower.as_str())
            && (2..=3).contains(&lower.len())
            && lower.chars().all(|c| c.is_ascii_alphabetic())
        {
            language = Some(lower);
        }
    }

    Some(SidecarName {
        language,
        is_forced,
        format: ext,
    })
}

/// Find external subtitle files for `video`, numbering them from `first_index`.
pub fn find_external_subtitles(video: &Path, first_index: i32) -> Vec<MediaStream> {
    let (Some(dir), Some(stem)) = (video.parent(), video.file_stem().and_then(|s| s.to_str()))
    else {
        return Vec::new();
    };

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Failed to list {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut found: Vec<(PathBuf, SidecarName)> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter_map(|path| {
            let name = path.file_name()?.to_str()?;
            let parsed = parse_sidecar_name(stem, name)?;
            Some((path, parsed))
        })
        .collect();
    found.sort_by(|a, b| a.0.cmp(&b.0));

    found
        .into_iter()
        .zip(first_index..)
        .map(|((path, name), index)| MediaStream {
            index,
            stream_type: MediaStreamType::Subtitle,
            codec: Some(name.format),
            language: name.language,
            title: None,
            is_external: true,
            is_forced: name.is_forced,
            is_default: false,
            path: Some(path),
        })
        .collect()
}

/// Where a new external subtitle for `video` should be written.
pub fn sidecar_path(
    video: &Path,
    language: &str,
    format: &str,
    is_forced: bool,
    is_hearing_impaired: bool,
) -> Result<PathBuf> {
    let format = format.to_ascii_lowercase();
    if !SUBTITLE_EXTENSIONS.contains(&format.as_str()) {
        return Err(SubtitleError::validation(format!(
            "unsupported subtitle format: {}",
            format
        )));
    }
    let language = language.to_ascii_lowercase();
    if language.is_empty() || !language.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(SubtitleError::validation(format!(
            "invalid subtitle language: {}",
            language
        )));
    }

    let (Some(dir), Some(stem)) = (video.parent(), video.file_stem().and_then(|s| s.to_str()))
    else {
        return Err(SubtitleError::not_found(format!(
            "media path {} has no parent directory",
            video.display()
        )));
    };

    let mut name = format!("{}.{}", stem, language);
    if is_forced {
        name.push_str(".forced");
    }
    if is_hearing_impaired {
        name.push_str(".sdh");
    }
    name.push('.');
    name.push_str(&format);

    Ok(dir.join(name))
}
