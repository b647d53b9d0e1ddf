//! Playlist generation module
//!
//! This module handles HLS subtitle playlist generation:
//! - Segment planning over a media runtime (segments.rs)
//! - Subtitle variant playlist rendering (variant.rs)

pub mod segments;
pub mod variant;

pub use segments::SegmentPlan;
pub use variant::{generate_subtitle_playlist, PLAYLIST_CONTENT_TYPE};
