//! Application state management
//!
//! This module defines the AppState structure that holds:
//! - The subtitle dispatcher and the collaborators behind it
//! - The refresh scheduler
//! - Server configuration
//! - The shutdown token that aborts in-flight encoder work

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::config::ServerConfig;
use crate::error::{Result, SubtitleError};
use crate::library::{Item, ItemRepository, MediaSourceProvider, SubtitleEncoder, SubtitleManager};
use crate::refresh::RefreshScheduler;
use crate::subtitle::SubtitleDispatcher;

/// Collaborators wired into the HTTP layer.
#[derive(Clone)]
pub struct Services {
    pub items: Arc<dyn ItemRepository>,
    pub sources: Arc<dyn MediaSourceProvider>,
    pub subtitles: Arc<dyn SubtitleManager>,
    pub encoder: Arc<dyn SubtitleEncoder>,
    pub auth: Arc<dyn AuthContext>,
    pub refresh: Arc<dyn RefreshScheduler>,
}

/// Shared application state
pub struct AppState {
    pub config: ServerConfig,
    pub dispatcher: SubtitleDispatcher,
    pub items: Arc<dyn ItemRepository>,
    pub subtitles: Arc<dyn SubtitleManager>,
    pub auth: Arc<dyn AuthContext>,
    pub refresh: Arc<dyn RefreshScheduler>,
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: ServerConfig, services: Services, shutdown: CancellationToken) -> Self {
        let dispatcher = SubtitleDispatcher::new(
            Arc::clone(&services.items),
            services.sources,
            services.encoder,
        );

        Self {
            config,
            dispatcher,
            items: services.items,
            subtitles: services.subtitles,
            auth: services.auth,
            refresh: services.refresh,
            shutdown,
        }
    }

    /// Look up an item, failing with `NotFound`.
    pub fn get_item(&self, id: Uuid) -> Result<Arc<Item>> {
        self.items
            .get_item_by_id(id)
            .ok_or_else(|| SubtitleError::not_found(format!("item {}", id)))
    }

    /// Token for work belonging to one request.
    pub fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }
}
