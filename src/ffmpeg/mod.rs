//! FFmpeg library setup
//!
//! The library is only used for reading stream metadata; conversions run through the
//! ffmpeg binary (see `transcode`).

use ffmpeg_next as ffmpeg;

use crate::error::Result;

/// Initialize FFmpeg and quiet its logging.
///
/// Call once at application startup, before any media file is opened.
pub fn init() -> Result<()> {
    ffmpeg::init()?;

    // Demuxer chatter on every open is noise; keep errors only
    unsafe {
        ffmpeg::ffi::av_log_set_level(ffmpeg::ffi::AV_LOG_ERROR as i32);
    }

    tracing::info!("FFmpeg initialized");
    Ok(())
}

/// Version of the linked libavformat, as `major.minor.micro`.
pub fn version_info() -> String {
    let v = ffmpeg::format::version();
    format!("libavformat {}.{}.{}", v >> 16, (v >> 8) & 0xff, v & 0xff)
}
