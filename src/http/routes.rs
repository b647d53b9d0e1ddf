//! Axum router configuration

use axum::{
    http::{header, HeaderName, Method},
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

use super::handlers::{health_check, version_check};
use super::subtitles::{
    delete_subtitle, download_remote_subtitles, get_remote_subtitles, search_remote_subtitles,
    subtitle_resource, upload_subtitle,
};

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
            Method::HEAD,
        ])
        .allow_headers([
            header::ACCEPT,
            header::RANGE,
            header::CONTENT_TYPE,
            header::ORIGIN,
            header::AUTHORIZATION,
            HeaderName::from_static("x-emby-token"),
            HeaderName::from_static("x-emby-authorization"),
            HeaderName::from_static("x-mediabrowser-token"),
        ])
        .max_age(Duration::from_secs(3600))
}

/// Create the Axum router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    let router = Router::new()
        // Health and version endpoints
        .route("/health", get(health_check))
        .route("/version", get(version_check))
        // Subtitle management
        .route("/Videos/{item_id}/Subtitles", post(upload_subtitle))
        .route("/Videos/{item_id}/Subtitles/{index}", delete(delete_subtitle))
        .route(
            "/Items/{item_id}/RemoteSearch/Subtitles/{key}",
            get(search_remote_subtitles).post(download_remote_subtitles),
        )
        .route("/Providers/Subtitles/Subtitles/{id}", get(get_remote_subtitles))
        // Streams and playlists; the tail is parsed by the handler
        .route(
            "/Videos/{item_id}/{media_source_id}/Subtitles/{index}/{*rest}",
            get(subtitle_resource),
        )
        .layer(TraceLayer::new_for_http());

    let router = if state.config.cors_enabled {
        router.layer(cors_layer())
    } else {
        router
    };

    router.with_state(state)
}
