//! Fixed-length segment planning
//!
//! Partitions `[0, runtime)` into consecutive segments of a nominal length.
//! Only the trailing segment can be shorter than the nominal length.

use crate::error::{Result, SubtitleError};
use crate::ticks::ticks_to_seconds;

/// One segment of the timeline, `[start_ticks, end_ticks)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start_ticks: i64,
    pub end_ticks: i64,
}

impl Segment {
    /// Actual length of this segment in ticks
    pub fn length_ticks(&self) -> i64 {
        self.end_ticks - self.start_ticks
    }

    /// Actual length of this segment in seconds
    pub fn duration_secs(&self) -> f64 {
        ticks_to_seconds(self.length_ticks())
    }
}

/// A validated segmentation request.
///
/// Cheap to copy; every call to [`SegmentPlan::segments`] starts a fresh
/// iteration from position zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentPlan {
    runtime_ticks: i64,
    segment_length_ticks: i64,
}

impl SegmentPlan {
    /// Validate the inputs and build a plan.
    pub fn new(runtime_ticks: i64, segment_length_ticks: i64) -> Result<Self> {
        if runtime_ticks <= 0 {
            return Err(SubtitleError::validation(
                "HLS subtitles are not supported for this media",
            ));
        }
        if segment_length_ticks <= 0 {
            return Err(SubtitleError::validation(
                "segmentLength was not given, or it was given incorrectly (it should be bigger than 0)",
            ));
        }
        Ok(Self {
            runtime_ticks,
            segment_length_ticks,
        })
    }

    pub fn runtime_ticks(&self) -> i64 {
        self.runtime_ticks
    }

    pub fn segment_length_ticks(&self) -> i64 {
        self.segment_length_ticks
    }

    /// Number of segments: `ceil(runtime / segment_length)`.
    pub fn segment_count(&self) -> usize {
        let full = self.runtime_ticks / self.segment_length_ticks;
        let partial = i64::from(self.runtime_ticks % self.segment_length_ticks != 0);
        (full + partial) as usize
    }

    /// Lazily iterate over the planned segments.
    pub fn segments(&self) -> Segments {
        Segments {
            position: 0,
            runtime_ticks: self.runtime_ticks,
            segment_length_ticks: self.segment_length_ticks,
        }
    }
}

impl IntoIterator for SegmentPlan {
    type Item = Segment;
    type IntoIter = Segments;

    fn into_iter(self) -> Segments {
        self.segments()
    }
}

/// Plan segments for `runtime_ticks` using a nominal `segment_length_ticks`.
pub fn plan_segments(runtime_ticks: i64, segment_length_ticks: i64) -> Result<Segments> {
    Ok(SegmentPlan::new(runtime_ticks, segment_length_ticks)?.segments())
}

/// Iterator over the segments of a [`SegmentPlan`].
#[derive(Debug, Clone)]
pub struct Segments {
    position: i64,
    runtime_ticks: i64,
    segment_length_ticks: i64,
}

impl Iterator for Segments {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        if self.position >= self.runtime_ticks {
            return None;
        }
        let start_ticks = self.position;
        // Advance by the nominal length; clamping only ever affects the last segment.
        let nominal_end = start_ticks.saturating_add(self.segment_length_ticks);
        let end_ticks = nominal_end.min(self.runtime_ticks);
        self.position = nominal_end;
        Some(Segment {
            start_ticks,
            end_ticks,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.position >= self.runtime_ticks {
            return (0, Some(0));
        }
        let remaining = self.runtime_ticks - self.position;
        let n = remaining / self.segment_length_ticks
            + i64::from(remaining % self.segment_length_ticks != 0);
        (n as usize, Some(n as usize))
    }
}

impl ExactSizeIterator for Segments {}

impl std::iter::FusedIterator for Segments {}
