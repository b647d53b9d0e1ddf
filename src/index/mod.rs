//! Media indexing module
//!
//! Opens video files and builds their catalog entries:
//! - Runtime from the container duration
//! - Embedded streams (video, audio, subtitle)
//! - External subtitle files sitting next to the video

pub mod scanner;
pub mod subtitle;

pub use scanner::{scan_dirs, scan_file};
pub use subtitle::{analyze_subtitle_stream, find_external_subtitles, sidecar_path};
