//! Subtitle HLS Server
//!
//! Serves subtitles for library items on demand: raw passthrough,
//! format conversion through ffmpeg, and segmented WebVTT playlists
//! for HLS players. Also manages external subtitle files (search,
//! download, upload, delete).

macro_rules! regex {
    ($re:literal $(,)?) => {{
        static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
        RE.get_or_init(|| regex::Regex::new($re).unwrap())
    }};
}

mod auth;
mod config;
mod config_file;
mod error;
mod ffmpeg;
mod http;
mod index;
mod library;
mod playlist;
mod refresh;
mod state;
mod subtitle;
mod ticks;
mod transcode;

use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::auth::HeaderAuthContext;
use crate::config::ServerConfig;
use crate::error::{Result, SubtitleError};
use crate::http::create_router;
use crate::library::LocalLibrary;
use crate::refresh::RefreshQueue;
use crate::state::{AppState, Services};
use crate::transcode::FfmpegSubtitleEncoder;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "subtitle-hls-server";

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let first = args.next();

    if first.as_deref() == Some("--generate-config") {
        let path = args.next().unwrap_or_else(|| "config.toml".to_string());
        config_file::generate_default_config(&path)?;
        println!("Wrote default configuration to {}", path);
        return Ok(());
    }

    // Load configuration
    let config_path = first.unwrap_or_else(|| "config.toml".to_string());
    let (config, config_error) = match config_file::read_server_config(&config_path) {
        Ok(config) => (config, None),
        Err(e) => (ServerConfig::default(), Some(e)),
    };

    init_logging(&config);
    if let Some(e) = config_error {
        tracing::warn!(
            "Failed to load config file {}: {}. Using defaults.",
            config_path,
            e
        );
    }

    tracing::info!("{} v{} starting", APP_NAME, VERSION);
    tracing::debug!("Configuration loaded: {:?}", config);

    ffmpeg::init()?;
    tracing::info!("FFmpeg version: {}", ffmpeg::version_info());

    let library = Arc::new(LocalLibrary::scan(config.library.media_dirs.clone()).await?);

    let shutdown = CancellationToken::new();
    let refresh = Arc::new(RefreshQueue::start(
        config.refresh.queue_capacity,
        library.clone(),
        shutdown.clone(),
    ));
    let encoder = Arc::new(FfmpegSubtitleEncoder::new(&config.encoder, library.clone()));

    let services = Services {
        items: library.clone(),
        sources: library.clone(),
        subtitles: library.clone(),
        encoder,
        auth: Arc::new(HeaderAuthContext),
        refresh,
    };
    let state = Arc::new(AppState::new(config.clone(), services, shutdown.clone()));

    // Build router
    let app = create_router(state);

    // Start server
    let addr: SocketAddr = config
        .socket_addr()
        .parse()
        .map_err(|e| SubtitleError::Config(format!("invalid listen address: {}", e)))?;
    tracing::info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutting down");
            shutdown.cancel();
        })
        .await?;

    Ok(())
}

/// Initialize logging with tracing
fn init_logging(config: &ServerConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "subtitle_hls_server={level},tower_http={level}",
            level = config.log_level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
