//! Output format resolution
//!
//! Normalizes the requested subtitle format token and picks how the
//! subtitle is delivered.

use std::path::Path;

/// How a subtitle request is satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Serve the stream's source file unmodified.
    RawPassthrough,
    /// Hand the request to the encoder and return its output.
    DirectTranscode,
    /// Encode to WebVTT, then inject an `X-TIMESTAMP-MAP` header.
    TimestampMappedVtt,
}

/// Normalize a format token: lowercase, with the legacy `js` alias
/// rewritten to `json`.
pub fn normalize_format(format: &str) -> String {
    let format = format.trim().to_ascii_lowercase();
    if format == "js" {
        "json".to_string()
    } else {
        format
    }
}

/// Decide the delivery mode for a requested format.
pub fn resolve(format: &str, add_vtt_time_map: bool) -> DeliveryMode {
    let format = normalize_format(format);
    if format.is_empty() {
        DeliveryMode::RawPassthrough
    } else if format == "vtt" && add_vtt_time_map {
        DeliveryMode::TimestampMappedVtt
    } else {
        DeliveryMode::DirectTranscode
    }
}

/// MIME type for a subtitle (or playlist) format token.
pub fn content_type_for_format(format: &str) -> &'static str {
    match normalize_format(format).as_str() {
        "vtt" => "text/vtt",
        "srt" => "application/x-subrip",
        "ass" | "ssa" => "text/x-ssa",
        "ttml" => "application/ttml+xml",
        "json" => "application/json",
        "m3u8" => crate::playlist::PLAYLIST_CONTENT_TYPE,
        _ => "application/octet-stream",
    }
}

/// MIME type derived from a file's extension.
pub fn content_type_for_path(path: &Path) -> &'static str {
    path.extension()
        .and_then(|e| e.to_str())
        .map(content_type_for_format)
        .unwrap_or("application/octet-stream")
}
