//! Subtitle delivery module
//!
//! This module turns subtitle requests into response bodies:
//! - Output format normalization and delivery mode selection
//! - WebVTT timestamp map injection for HLS segments
//! - Dispatch to the source file or the encoder

pub mod dispatcher;
pub mod format;
pub mod timestamp_map;

pub use dispatcher::{PlaylistRequest, SubtitleBody, SubtitleContent, SubtitleDispatcher, SubtitleRequest};
pub use format::content_type_for_format;
