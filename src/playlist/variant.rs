//! Subtitle variant playlist generator
//!
//! Generates an HLS VOD playlist whose entries request WebVTT segments of
//! a subtitle stream, one request per planned segment.

use std::fmt::Write;

use super::segments::{Segment, SegmentPlan};
use crate::ticks::TICKS_PER_SECOND;

/// Content type for HLS playlists
pub const PLAYLIST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";

/// Build the relative URL a player uses to fetch one WebVTT segment.
/// The token is percent-encoded.
pub fn segment_url(segment: &Segment, access_token: &str) -> String {
    format!(
        "stream.vtt?CopyTimestamps=true&AddVttTimeMap=true&StartPositionTicks={}&EndPositionTicks={}&api_key={}",
        segment.start_ticks,
        segment.end_ticks,
        urlencoding::encode(access_token)
    )
}

/// Generate the subtitle variant playlist
///
/// `#EXT-X-TARGETDURATION` carries the nominal segment length; each
/// `#EXTINF` carries the actual (possibly truncated) segment duration.
pub fn generate_subtitle_playlist(plan: &SegmentPlan, access_token: &str) -> String {
    let mut output = String::new();

    let target_duration = plan.segment_length_ticks() / TICKS_PER_SECOND;

    // Header
    output.push_str("#EXTM3U\n");
    let _ = writeln!(output, "#EXT-X-TARGETDURATION:{}", target_duration);
    output.push_str("#EXT-X-VERSION:3\n");
    output.push_str("#EXT-X-MEDIA-SEQUENCE:0\n");
    output.push_str("#EXT-X-PLAYLIST-TYPE:VOD\n");

    for segment in plan.segments() {
        let _ = writeln!(output, "#EXTINF:{},", segment.duration_secs());
        output.push_str(&segment_url(&segment, access_token));
        output.push('\n');
    }

    // End list
    output.push_str("#EXT-X-ENDLIST\n");

    output
}
