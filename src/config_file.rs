//! Configuration file support
//!
//! Loads server configuration from TOML files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::{EncoderConfig, LibraryConfig, RefreshConfig, ServerConfig};
use crate::error::{Result, SubtitleError};

/// Configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Server settings
    pub server: ServerSettings,
    /// Library settings
    pub library: Option<LibrarySettings>,
    /// Encoder settings
    pub encoder: Option<EncoderSettings>,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
    /// Refresh queue settings
    pub refresh: Option<RefreshSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Enable CORS
    pub cors_enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibrarySettings {
    /// Directories to scan for video files
    #[serde(default)]
    pub media_dirs: Vec<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderSettings {
    /// ffmpeg binary
    pub ffmpeg_path: Option<PathBuf>,
    /// Per-request conversion timeout in seconds
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshSettings {
    /// Capacity of each priority lane
    pub queue_capacity: Option<usize>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&content).map_err(|e| SubtitleError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| SubtitleError::Config(e.to_string()))?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Generate default configuration file
    pub fn default_config() -> Self {
        let defaults = ServerConfig::default();
        Self {
            server: ServerSettings {
                host: defaults.host,
                port: defaults.port,
                cors_enabled: Some(true),
            },
            library: Some(LibrarySettings {
                media_dirs: Vec::new(),
            }),
            encoder: Some(EncoderSettings {
                ffmpeg_path: Some(defaults.encoder.ffmpeg_path),
                timeout_secs: Some(defaults.encoder.timeout_secs),
            }),
            logging: Some(LoggingSettings {
                level: "info".to_string(),
                format: Some("pretty".to_string()),
            }),
            refresh: Some(RefreshSettings {
                queue_capacity: Some(defaults.refresh.queue_capacity),
            }),
        }
    }

    /// Convert to ServerConfig
    pub fn into_server_config(self) -> ServerConfig {
        let encoder_defaults = EncoderConfig::default();
        let refresh_defaults = RefreshConfig::default();
        let (log_level, log_format) = match self.logging {
            Some(l) => (l.level, l.format.unwrap_or_else(|| "pretty".to_string())),
            None => ("info".to_string(), "pretty".to_string()),
        };

        ServerConfig {
            host: self.server.host,
            port: self.server.port,
            cors_enabled: self.server.cors_enabled.unwrap_or(true),
            log_level,
            log_format,
            library: LibraryConfig {
                media_dirs: self.library.map(|l| l.media_dirs).unwrap_or_default(),
            },
            encoder: EncoderConfig {
                ffmpeg_path: self
                    .encoder
                    .as_ref()
                    .and_then(|e| e.ffmpeg_path.clone())
                    .unwrap_or(encoder_defaults.ffmpeg_path),
                timeout_secs: self
                    .encoder
                    .as_ref()
                    .and_then(|e| e.timeout_secs)
                    .unwrap_or(encoder_defaults.timeout_secs),
            },
            refresh: RefreshConfig {
                queue_capacity: self
                    .refresh
                    .and_then(|r| r.queue_capacity)
                    .unwrap_or(refresh_defaults.queue_capacity),
            },
        }
    }
}

/// Read the server configuration from `path`. A missing file yields the
/// defaults; an unreadable or invalid one is an error.
pub fn read_server_config<P: AsRef<Path>>(path: P) -> Result<ServerConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(ServerConfig::default());
    }
    Ok(ConfigFile::from_file(path)?.into_server_config())
}

/// Generate default configuration file at the specified path
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    ConfigFile::default_config().to_file(path)
}
