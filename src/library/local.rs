//! In-memory catalog backed by the media directories on disk.

use async_trait::async_trait;
use base64::Engine;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use super::ports::{ItemRepository, MediaSourceProvider, RemoteSubtitleProvider, SubtitleManager};
use super::types::{
    Item, MediaSource, RemoteSubtitle, RemoteSubtitleInfo, SubtitleSearchRequest,
    UploadSubtitleDto,
};
use crate::error::{Result, SubtitleError};
use crate::index::{scan_dirs, scan_file, sidecar_path};
use crate::refresh::{ItemRefresher, RefreshOptions};

/// Catalog of scanned items plus the registered remote subtitle providers.
pub struct LocalLibrary {
    items: DashMap<Uuid, Arc<Item>>,
    providers: RwLock<Vec<Arc<dyn RemoteSubtitleProvider>>>,
}

impl Default for LocalLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalLibrary {
    pub fn new() -> Self {
        Self {
            items: DashMap::new(),
            providers: RwLock::new(Vec::new()),
        }
    }

    /// Build a library from every video under `dirs`.
    pub async fn scan(dirs: Vec<PathBuf>) -> Result<Self> {
        let items = tokio::task::spawn_blocking(move || scan_dirs(&dirs))
            .await
            .map_err(|e| SubtitleError::Internal(format!("scan task failed: {}", e)))?;

        let library = Self::new();
        for item in items {
            library.insert(item);
        }
        tracing::info!("Library loaded with {} items", library.len());
        Ok(library)
    }

    pub fn insert(&self, item: Item) -> Arc<Item> {
        let item = Arc::new(item);
        self.items.insert(item.id, Arc::clone(&item));
        item
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn register_provider(&self, provider: Arc<dyn RemoteSubtitleProvider>) {
        tracing::info!("Registered subtitle provider: {}", provider.name());
        self.providers.write().push(provider);
    }

    fn providers(&self) -> Vec<Arc<dyn RemoteSubtitleProvider>> {
        self.providers.read().clone()
    }

    fn provider(&self, name: &str) -> Result<Arc<dyn RemoteSubtitleProvider>> {
        self.providers
            .read()
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| SubtitleError::not_found(format!("subtitle provider {}", name)))
    }

    /// Drop the external stream backed by `path` from the cached item.
    fn forget_subtitle(&self, item_id: Uuid, path: &Path) {
        if let Some(mut entry) = self.items.get_mut(&item_id) {
            let mut item = Item::clone(entry.value());
            for source in &mut item.media_sources {
                source
                    .media_streams
                    .retain(|s| !(s.is_external && s.path.as_deref() == Some(path)));
            }
            *entry.value_mut() = Arc::new(item);
        }
    }

    /// Rescan an item's media file and replace its catalog entry.
    pub async fn rescan_item(&self, item_id: Uuid) -> Result<Arc<Item>> {
        let path = self
            .get_item_by_id(item_id)
            .map(|item| item.path.clone())
            .ok_or_else(|| SubtitleError::not_found(format!("item {}", item_id)))?;

        let item = tokio::task::spawn_blocking(move || scan_file(path))
            .await
            .map_err(|e| SubtitleError::Internal(format!("scan task failed: {}", e)))??;

        Ok(self.insert(item))
    }
}

/// Split `<provider>_<providerSubtitleId>`.
fn split_subtitle_id(id: &str) -> Result<(&str, &str)> {
    match id.split_once('_') {
        Some((provider, rest)) if !provider.is_empty() && !rest.is_empty() => Ok((provider, rest)),
        _ => Err(SubtitleError::not_found(format!("subtitle {}", id))),
    }
}

impl ItemRepository for LocalLibrary {
    fn get_item_by_id(&self, id: Uuid) -> Option<Arc<Item>> {
        self.items.get(&id).map(|entry| Arc::clone(entry.value()))
    }
}

#[async_trait]
impl MediaSourceProvider for LocalLibrary {
    fn get_static_media_sources(&self, item: &Item) -> Vec<MediaSource> {
        item.media_sources.clone()
    }

    async fn get_media_source(&self, item: &Item, media_source_id: &str) -> Result<MediaSource> {
        // Re-read the catalog so sidecars added since `item` was fetched are visible
        let current = self.get_item_by_id(item.id);
        let sources = current
            .as_deref()
            .map(|i| i.media_sources.as_slice())
            .unwrap_or(&item.media_sources);

        sources
            .iter()
            .find(|s| s.id.eq_ignore_ascii_case(media_source_id))
            .cloned()
            .ok_or_else(|| SubtitleError::not_found(format!("media source {}", media_source_id)))
    }
}

#[async_trait]
impl SubtitleManager for LocalLibrary {
    async fn search_subtitles(
        &self,
        item: &Item,
        language: &str,
        is_perfect_match: bool,
    ) -> Result<Vec<RemoteSubtitleInfo>> {
        let request = SubtitleSearchRequest {
            item_id: item.id,
            name: item.name.clone(),
            media_path: item.path.clone(),
            language: language.to_string(),
            runtime_ticks: item.media_sources.first().and_then(|s| s.run_time_ticks),
            is_perfect_match,
        };

        let mut results = Vec::new();
        for provider in self.providers() {
            let found = provider.search(&request).await.map_err(|e| {
                SubtitleError::Upstream(format!("{} search failed: {}", provider.name(), e))
            })?;
            tracing::debug!("{} returned {} subtitles", provider.name(), found.len());
            results.extend(found);
        }

        if is_perfect_match {
            results.retain(|r| r.is_hash_match == Some(true));
        }
        results.sort_by(|a, b| {
            let hash = |r: &RemoteSubtitleInfo| r.is_hash_match.unwrap_or(false);
            hash(b)
                .cmp(&hash(a))
                .then_with(|| b.download_count.unwrap_or(0).cmp(&a.download_count.unwrap_or(0)))
        });

        Ok(results)
    }

    async fn download_subtitles(&self, item: &Item, subtitle_id: &str) -> Result<()> {
        let (provider_name, remote_id) = split_subtitle_id(subtitle_id)?;
        let provider = self.provider(provider_name)?;

        let subtitle = provider.fetch(remote_id).await.map_err(|e| match e {
            SubtitleError::NotFound(_) => e,
            other => SubtitleError::Upstream(format!("{} fetch failed: {}", provider_name, other)),
        })?;

        let language = subtitle.language.as_deref().unwrap_or("und");
        let path = sidecar_path(&item.path, language, &subtitle.format, false, false)?;
        tokio::fs::write(&path, &subtitle.data).await?;

        tracing::info!("Saved subtitle {} to {:?}", subtitle_id, path);
        Ok(())
    }

    async fn delete_subtitles(&self, item: &Item, index: i32) -> Result<()> {
        let current = self.get_item_by_id(item.id);
        let item = current.as_deref().unwrap_or(item);

        let path = item
            .media_sources
            .iter()
            .filter_map(|s| s.subtitle_stream(index))
            .find(|s| s.is_external)
            .and_then(|s| s.path.clone())
            .ok_or_else(|| {
                SubtitleError::not_found(format!("external subtitle {} of item {}", index, item.id))
            })?;

        tokio::fs::remove_file(&path).await?;
        tracing::info!("Deleted subtitle file {:?}", path);

        if let Err(e) = self.rescan_item(item.id).await {
            tracing::warn!(item_id = %item.id, "Rescan after delete failed: {}", e);
            self.forget_subtitle(item.id, &path);
        }
        Ok(())
    }

    async fn get_remote_subtitles(&self, id: &str) -> Result<RemoteSubtitle> {
        let (provider_name, remote_id) = split_subtitle_id(id)?;
        let provider = self.provider(provider_name)?;
        provider.fetch(remote_id).await
    }

    async fn upload_subtitle(&self, item: &Item, upload: UploadSubtitleDto) -> Result<()> {
        let data = base64::engine::general_purpose::STANDARD
            .decode(upload.data.trim())
            .map_err(|e| SubtitleError::validation(format!("invalid subtitle data: {}", e)))?;

        let path = sidecar_path(
            &item.path,
            &upload.language,
            &upload.format,
            upload.is_forced,
            upload.is_hearing_impaired,
        )?;
        tokio::fs::write(&path, &data).await?;
        tracing::info!("Uploaded subtitle saved to {:?}", path);

        // The queued refresh picks the file up later
        if let Err(e) = self.rescan_item(item.id).await {
            tracing::warn!(item_id = %item.id, "Rescan after upload failed: {}", e);
        }
        Ok(())
    }
}

#[async_trait]
impl ItemRefresher for LocalLibrary {
    async fn refresh_item(&self, item_id: Uuid, _options: &RefreshOptions) -> Result<()> {
        let item = self.rescan_item(item_id).await?;
        tracing::debug!(
            "Refreshed item {} ({} subtitle streams)",
            item_id,
            item.media_sources
                .iter()
                .map(|s| s.subtitle_streams().count())
                .sum::<usize>()
        );
        Ok(())
    }
}
