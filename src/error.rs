use thiserror::Error;

/// Main error type for the subtitle server
#[derive(Error, Debug)]
pub enum SubtitleError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("FFmpeg error: {0}")]
    Ffmpeg(#[from] ffmpeg_next::Error),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SubtitleError {
    /// Shorthand for a `NotFound` error.
    pub fn not_found(what: impl Into<String>) -> Self {
        SubtitleError::NotFound(what.into())
    }

    /// Shorthand for a `Validation` error.
    pub fn validation(msg: impl Into<String>) -> Self {
        SubtitleError::Validation(msg.into())
    }

    /// Client errors are surfaced as-is and never retried.
    pub fn is_client_error(&self) -> bool {
        matches!(self, SubtitleError::NotFound(_) | SubtitleError::Validation(_))
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SubtitleError>;
