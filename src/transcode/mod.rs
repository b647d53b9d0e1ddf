//! Subtitle transcoding module
//!
//! Conversion runs through the ffmpeg command line:
//! - Argument construction (seek, duration, stream mapping, muxer)
//! - Process execution with timeout and kill-on-drop
//! - SRT to JSON track-event conversion for the `json` format

pub mod encoder;
pub mod json;

pub use encoder::FfmpegSubtitleEncoder;
