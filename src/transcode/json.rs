//! JSON subtitle output
//!
//! ffmpeg has no JSON muxer, so `json` requests are encoded as SRT and the
//! cues are rewritten as `{"TrackEvents":[...]}` with tick positions.

use serde::Serialize;
use srtlib::{ParsingError, Subtitles, Timestamp};

use crate::error::{Result, SubtitleError};
use crate::ticks::TICKS_PER_SECOND;

/// One cue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TrackEvent {
    pub id: String,
    pub text: String,
    pub start_position_ticks: i64,
    pub end_position_ticks: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SubtitleTrackInfo {
    track_events: Vec<TrackEvent>,
}

fn timestamp_to_ticks(timestamp: &Timestamp) -> i64 {
    let (hours, minutes, seconds, millis) = timestamp.get();
    let total_ms = ((i64::from(hours) * 60 + i64::from(minutes)) * 60 + i64::from(seconds)) * 1000
        + i64::from(millis);
    total_ms * (TICKS_PER_SECOND / 1000)
}

/// Parse SRT text into cues.
pub fn parse_srt(srt: &str) -> std::result::Result<Vec<TrackEvent>, ParsingError> {
    let normalized = srt.replace("\r\n", "\n");
    let normalized = normalized.trim();
    if normalized.is_empty() {
        return Ok(Vec::new());
    }

    let subtitles = Subtitles::parse_from_str(normalized.to_string())?;
    Ok(subtitles
        .to_vec()
        .into_iter()
        .map(|subtitle| TrackEvent {
            id: subtitle.num.to_string(),
            start_position_ticks: timestamp_to_ticks(&subtitle.start_time),
            end_position_ticks: timestamp_to_ticks(&subtitle.end_time),
            text: subtitle.text,
        })
        .collect())
}

/// Convert SRT text into the JSON track-event document.
pub fn srt_to_json(srt: &str) -> Result<String> {
    let track_events =
        parse_srt(srt).map_err(|e| SubtitleError::Encoding(format!("invalid SRT output: {}", e)))?;
    serde_json::to_string(&SubtitleTrackInfo { track_events })
        .map_err(|e| SubtitleError::Encoding(format!("json conversion failed: {}", e)))
}
