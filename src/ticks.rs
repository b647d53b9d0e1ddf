//! 100-nanosecond tick arithmetic
//!
//! Media runtimes and positions are carried as `i64` tick counts, the same
//! unit the rest of the media stack uses for `RunTimeTicks`.

/// Ticks in one second.
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Ticks in one microsecond (FFmpeg's `AV_TIME_BASE` unit).
pub const TICKS_PER_MICROSECOND: i64 = 10;

/// Convert whole seconds to ticks. `None` on overflow.
pub fn seconds_to_ticks(seconds: i64) -> Option<i64> {
    seconds.checked_mul(TICKS_PER_SECOND)
}

/// Convert ticks to fractional seconds.
pub fn ticks_to_seconds(ticks: i64) -> f64 {
    ticks as f64 / TICKS_PER_SECOND as f64
}

/// Convert an FFmpeg `AV_TIME_BASE` duration to ticks.
/// Unknown (`AV_NOPTS_VALUE`) or non-positive durations yield `None`.
pub fn microseconds_to_ticks(us: i64) -> Option<i64> {
    if us <= 0 {
        return None;
    }
    us.checked_mul(TICKS_PER_MICROSECOND)
}

/// Format ticks as an ffmpeg command-line time offset in seconds.
pub fn ticks_to_ffmpeg_time(ticks: i64) -> String {
    let ticks = ticks.max(0);
    let secs = ticks / TICKS_PER_SECOND;
    let micros = (ticks % TICKS_PER_SECOND) / TICKS_PER_MICROSECOND;
    format!("{}.{:06}", secs, micros)
}
