//! Server configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Media library configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Directories scanned for video files at startup
    pub media_dirs: Vec<PathBuf>,
}

/// Subtitle encoder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Path (or name on $PATH) of the ffmpeg binary
    pub ffmpeg_path: PathBuf,

    /// Maximum time a single subtitle conversion may take
    pub timeout_secs: u64,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            timeout_secs: 60,
        }
    }
}

/// Metadata refresh queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Capacity of each priority lane
    pub queue_capacity: usize,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self { queue_capacity: 100 }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Enable CORS
    pub cors_enabled: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log output format (pretty, json)
    pub log_format: String,

    /// Library configuration
    pub library: LibraryConfig,

    /// Encoder configuration
    pub encoder: EncoderConfig,

    /// Refresh queue configuration
    pub refresh: RefreshConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8096,
            cors_enabled: true,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            library: LibraryConfig::default(),
            encoder: EncoderConfig::default(),
            refresh: RefreshConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether logs should be emitted as JSON lines
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}
