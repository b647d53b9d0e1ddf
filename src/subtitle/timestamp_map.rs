//! WebVTT timestamp map injection
//!
//! HLS players align WebVTT segments with the media timeline through an
//! `X-TIMESTAMP-MAP` header. Segments produced with copied timestamps are
//! pinned to local time zero at MPEG-TS time 900000 (10 s at 90 kHz).

/// Header marker that opens every WebVTT payload.
pub const WEBVTT_MARKER: &str = "WEBVTT";

/// The declaration inserted after the marker.
pub const TIMESTAMP_MAP: &str = "X-TIMESTAMP-MAP=MPEGTS:900000,LOCAL:00:00:00.000";

/// Insert the timestamp map after the first `WEBVTT` marker.
///
/// Not idempotent: apply once per payload.
pub fn map_to_absolute(vtt: &str) -> String {
    vtt.replacen(WEBVTT_MARKER, &format!("{}\n{}", WEBVTT_MARKER, TIMESTAMP_MAP), 1)
}
