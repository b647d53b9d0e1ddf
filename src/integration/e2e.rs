//! End-to-end tests through the HTTP router

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;

use crate::integration::fixtures::{
    sample_item, FakeEncoder, MemoryCatalog, TestApp, EMBEDDED_SUBTITLE, EXTERNAL_SUBTITLE,
    SAMPLE_SRT,
};
use crate::integration::validation::{
    segment_durations, segment_uris, validate_subtitle_playlist, validate_webvtt,
};
use crate::library::Item;
use crate::refresh::RefreshPriority;

const VTT: &str = "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\nHello\n";

fn subtitles_base(item: &Item, index: i32) -> String {
    format!(
        "/Videos/{}/{}/Subtitles/{}",
        item.id, item.media_sources[0].id, index
    )
}

async fn send(app: &TestApp, method: Method, uri: &str, body: Body) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .unwrap();
    app.router.clone().oneshot(request).await.unwrap()
}

async fn get(app: &TestApp, uri: &str) -> Response {
    send(app, Method::GET, uri, Body::empty()).await
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn content_type(response: &Response) -> &str {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

fn app_for(item: &Item, encoder: Arc<FakeEncoder>) -> TestApp {
    TestApp::new(MemoryCatalog::with_item(item.clone()), encoder)
}

#[tokio::test]
async fn test_playlist_endpoint() {
    let item = sample_item(Some(3_600_000_000), None);
    let app = app_for(&item, FakeEncoder::new(VTT));

    let uri = format!(
        "{}/subtitles.m3u8?SegmentLength=60&api_key=secret",
        subtitles_base(&item, EMBEDDED_SUBTITLE)
    );
    let response = get(&app, &uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "application/vnd.apple.mpegurl");
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");

    let playlist = body_text(response).await;
    let result = validate_subtitle_playlist(&playlist);
    assert!(result.is_valid, "{:?}", result.errors);
    assert!(result.warnings.is_empty());
    assert!(playlist.contains("#EXT-X-TARGETDURATION:60\n"));
    assert_eq!(segment_durations(&playlist), vec![60.0; 6]);
    assert_eq!(
        segment_uris(&playlist)[5],
        "stream.vtt?CopyTimestamps=true&AddVttTimeMap=true&StartPositionTicks=3000000000&EndPositionTicks=3600000000&api_key=secret"
    );
}

#[tokio::test]
async fn test_playlist_token_from_header() {
    let item = sample_item(Some(3_650_000_000), None);
    let app = app_for(&item, FakeEncoder::new(VTT));

    let request = Request::builder()
        .uri(format!(
            "{}/subtitles.m3u8?segmentLength=60",
            subtitles_base(&item, EMBEDDED_SUBTITLE)
        ))
        .header("X-Emby-Token", "hdr")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let playlist = body_text(response).await;
    assert_eq!(segment_durations(&playlist).last(), Some(&5.0));
    assert!(segment_uris(&playlist).iter().all(|u| u.ends_with("&api_key=hdr")));
}

#[tokio::test]
async fn test_playlist_validation_errors() {
    let item = sample_item(Some(3_600_000_000), None);
    let app = app_for(&item, FakeEncoder::new(VTT));
    let base = subtitles_base(&item, EMBEDDED_SUBTITLE);

    for query in ["", "?segmentLength=0", "?segmentLength=-1"] {
        let response = get(&app, &format!("{}/subtitles.m3u8{}", base, query)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("segmentLength"));
    }

    let response = get(&app, &format!("{}/subtitles.m3u8?segmentLength=ten", base)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let no_runtime = sample_item(None, None);
    let app = app_for(&no_runtime, FakeEncoder::new(VTT));
    let response = get(
        &app,
        &format!("{}/subtitles.m3u8?segmentLength=60", subtitles_base(&no_runtime, EMBEDDED_SUBTITLE)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("not supported"));
}

#[tokio::test]
async fn test_playlist_segment_urls_resolve() {
    let item = sample_item(Some(1_200_000_000), None);
    let app = app_for(&item, FakeEncoder::new(VTT));
    let base = subtitles_base(&item, EMBEDDED_SUBTITLE);

    let playlist = body_text(
        get(&app, &format!("{}/subtitles.m3u8?segmentLength=60&api_key=t", base)).await,
    )
    .await;

    for uri in segment_uris(&playlist) {
        let response = get(&app, &format!("{}/{}", base, uri)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(content_type(&response), "text/vtt");
        let result = validate_webvtt(&body_text(response).await);
        assert!(result.is_valid, "{:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    let calls = app.encoder.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!((calls[0].start_ticks, calls[0].end_ticks), (0, 600_000_000));
    assert_eq!((calls[1].start_ticks, calls[1].end_ticks), (600_000_000, 1_200_000_000));
    assert!(calls.iter().all(|c| c.copy_timestamps && c.format == "vtt"));
    assert!(calls.iter().all(|c| c.stream.stream_index == EMBEDDED_SUBTITLE));
}

#[tokio::test]
async fn test_stream_with_route_start_ticks() {
    let item = sample_item(Some(3_600_000_000), None);
    let app = app_for(&item, FakeEncoder::new(SAMPLE_SRT));

    let uri = format!(
        "{}/600000000/Stream.srt?StartPositionTicks=5&endPositionTicks=1200000000",
        subtitles_base(&item, EMBEDDED_SUBTITLE)
    );
    let response = get(&app, &uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "application/x-subrip");
    assert_eq!(body_text(response).await, SAMPLE_SRT);

    let calls = app.encoder.calls();
    assert_eq!(calls[0].format, "srt");
    assert_eq!(calls[0].start_ticks, 600_000_000);
    assert_eq!(calls[0].end_ticks, 1_200_000_000);
    assert!(!calls[0].copy_timestamps);
}

#[tokio::test]
async fn test_stream_js_alias() {
    let item = sample_item(Some(3_600_000_000), None);
    let app = app_for(&item, FakeEncoder::new(r#"{"TrackEvents":[]}"#));

    let response = get(&app, &format!("{}/Stream.js", subtitles_base(&item, EMBEDDED_SUBTITLE))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "application/json");

    let calls = app.encoder.calls();
    assert_eq!(calls[0].format, "json");
    assert_eq!(calls[0].end_ticks, 0);
}

#[tokio::test]
async fn test_vtt_without_time_map() {
    let item = sample_item(Some(3_600_000_000), None);
    let app = app_for(&item, FakeEncoder::new(VTT));

    let response = get(&app, &format!("{}/Stream.vtt", subtitles_base(&item, EMBEDDED_SUBTITLE))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, VTT);
}

#[tokio::test]
async fn test_stream_errors() {
    let item = sample_item(Some(3_600_000_000), None);
    let base = subtitles_base(&item, EMBEDDED_SUBTITLE);

    let app = app_for(&item, FakeEncoder::failing());
    let response = get(&app, &format!("{}/Stream.srt", base)).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = get(&app, &format!("{}/master.m3u8", base)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(&app, &format!("{}/Stream.vtt?copyTimestamps=perhaps", base)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let other = sample_item(Some(1), Some("/elsewhere/Other.srt".into()));
    let response = get(&app, &format!("{}/Stream.srt", subtitles_base(&other, EMBEDDED_SUBTITLE))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_negative_positions_are_bad_requests() {
    let item = sample_item(Some(3_600_000_000), None);
    let app = app_for(&item, FakeEncoder::new(VTT));
    let base = subtitles_base(&item, EMBEDDED_SUBTITLE);

    for query in [
        "startPositionTicks=-1&endPositionTicks=9223372036854775807",
        "endPositionTicks=-5",
    ] {
        let response = get(&app, &format!("{}/stream.vtt?CopyTimestamps=true&AddVttTimeMap=true&{}", base, query)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
    assert!(app.encoder.calls().is_empty());
}

#[tokio::test]
async fn test_playlist_token_round_trips() {
    let item = sample_item(Some(1_200_000_000), None);
    let app = app_for(&item, FakeEncoder::new(VTT));
    let base = subtitles_base(&item, EMBEDDED_SUBTITLE);

    let playlist = body_text(
        get(&app, &format!("{}/subtitles.m3u8?segmentLength=60&api_key=a%26b%20c", base)).await,
    )
    .await;
    let uri = segment_uris(&playlist)[0].to_string();
    assert!(uri.ends_with("&api_key=a%26b%20c"));

    let query = crate::http::query::QueryParams::from_uri(&format!("{}/{}", base, uri).parse().unwrap())
        .unwrap();
    assert_eq!(query.get("api_key"), Some("a&b c"));

    let response = get(&app, &format!("{}/{}", base, uri)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_shutdown_cancels_encoding() {
    let item = sample_item(Some(3_600_000_000), None);
    let app = app_for(&item, FakeEncoder::delayed(VTT, Duration::from_secs(30)));
    app.shutdown.cancel();

    let response = tokio::time::timeout(
        Duration::from_secs(5),
        get(&app, &format!("{}/Stream.vtt?addVttTimeMap=true", subtitles_base(&item, EMBEDDED_SUBTITLE))),
    )
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_raw_passthrough() {
    let dir = tempfile::TempDir::new().unwrap();
    let sidecar = dir.path().join("Movie.en.srt");
    std::fs::write(&sidecar, SAMPLE_SRT).unwrap();
    let item = sample_item(Some(3_600_000_000), Some(sidecar));
    let app = app_for(&item, FakeEncoder::new(VTT));

    let response = get(&app, &format!("{}/Stream", subtitles_base(&item, EXTERNAL_SUBTITLE))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "application/x-subrip");
    assert_eq!(body_text(response).await, SAMPLE_SRT);
    assert!(app.encoder.calls().is_empty());
}

#[tokio::test]
async fn test_delete_subtitle() {
    let dir = tempfile::TempDir::new().unwrap();
    let item = sample_item(Some(1), Some(dir.path().join("Movie.en.srt")));
    let app = app_for(&item, FakeEncoder::new(VTT));

    let uri = format!("/Videos/{}/Subtitles/{}", item.id, EXTERNAL_SUBTITLE);
    let response = send(&app, Method::DELETE, &uri, Body::empty()).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(*app.catalog.deleted.lock(), vec![(item.id, EXTERNAL_SUBTITLE)]);

    let uri = format!("/Videos/{}/Subtitles/{}", item.id, EMBEDDED_SUBTITLE);
    let response = send(&app, Method::DELETE, &uri, Body::empty()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let uri = format!("/Videos/{}/Subtitles/3", uuid::Uuid::new_v4());
    let response = send(&app, Method::DELETE, &uri, Body::empty()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_remote_search() {
    let item = sample_item(Some(1), None);
    let app = app_for(&item, FakeEncoder::new(VTT));

    let response = get(
        &app,
        &format!("/Items/{}/RemoteSearch/Subtitles/fre?isPerfectMatch=false", item.id),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let results: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(results[0]["Id"], "mock_1");
    assert_eq!(results[0]["ThreeLetterISOLanguageName"], "fre");

    let response = get(&app, &format!("/Items/{}/RemoteSearch/Subtitles/fre", uuid::Uuid::new_v4())).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_download_queues_refresh() {
    let item = sample_item(Some(1), None);
    let app = app_for(&item, FakeEncoder::new(VTT));

    let uri = format!("/Items/{}/RemoteSearch/Subtitles/mock_1", item.id);
    let response = send(&app, Method::POST, &uri, Body::empty()).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(*app.catalog.downloads.lock(), vec!["mock_1".to_string()]);
    assert_eq!(*app.refresh.queued.lock(), vec![(item.id, RefreshPriority::High)]);
}

#[tokio::test]
async fn test_download_failure_is_swallowed() {
    let item = sample_item(Some(1), None);
    let app = TestApp::new(MemoryCatalog::with_failing_downloads(item.clone()), FakeEncoder::new(VTT));

    let uri = format!("/Items/{}/RemoteSearch/Subtitles/mock_1", item.id);
    let response = send(&app, Method::POST, &uri, Body::empty()).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.catalog.downloads.lock().len(), 1);
    assert!(app.refresh.queued.lock().is_empty());
}

#[tokio::test]
async fn test_provider_fetch() {
    let item = sample_item(Some(1), None);
    let app = app_for(&item, FakeEncoder::new(VTT));

    let response = get(&app, "/Providers/Subtitles/Subtitles/mock_1").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "application/x-subrip");
    assert_eq!(body_text(response).await, SAMPLE_SRT);

    let response = get(&app, "/Providers/Subtitles/Subtitles/mock_2").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_subtitle() {
    let item = sample_item(Some(1), None);
    let app = app_for(&item, FakeEncoder::new(VTT));
    let uri = format!("/Videos/{}/Subtitles", item.id);

    let body = r#"{"Language":"eng","Format":"srt","IsForced":true,"Data":"MQ=="}"#;
    let response = send(&app, Method::POST, &uri, Body::from(body)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    {
        let uploads = app.catalog.uploads.lock();
        assert_eq!(uploads.len(), 1);
        assert!(uploads[0].is_forced);
        assert!(!uploads[0].is_hearing_impaired);
    }
    assert_eq!(*app.refresh.queued.lock(), vec![(item.id, RefreshPriority::High)]);

    let body = r#"{"Language":"eng","Format":"exe","Data":"MQ=="}"#;
    let response = send(&app, Method::POST, &uri, Body::from(body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.refresh.queued.lock().len(), 1);
}

#[tokio::test]
async fn test_service_endpoints_and_cors() {
    let item = sample_item(Some(1), None);
    let app = app_for(&item, FakeEncoder::new(VTT));

    let response = get(&app, "/health").await;
    assert_eq!(body_text(response).await, "OK");

    let response = get(&app, "/version").await;
    let version: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(version["status"], "ok");

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri(format!("{}/subtitles.m3u8", subtitles_base(&item, EMBEDDED_SUBTITLE)))
        .header(header::ORIGIN, "http://localhost:8080")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "x-emby-token")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn test_over_real_socket() {
    let item = sample_item(Some(3_650_000_000), None);
    let app = app_for(&item, FakeEncoder::new(VTT));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    let base = format!("http://{}{}", addr, subtitles_base(&item, EMBEDDED_SUBTITLE));
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/subtitles.m3u8?segmentLength=60", base))
        .header("Authorization", r#"MediaBrowser Client="test", Token="sock""#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let playlist = response.text().await.unwrap();
    assert_eq!(segment_uris(&playlist).len(), 7);

    let last = segment_uris(&playlist)[6].to_string();
    assert!(last.contains("StartPositionTicks=3600000000&EndPositionTicks=3650000000&api_key=sock"));
    let vtt = client
        .get(format!("{}/{}", base, last))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(vtt.starts_with("WEBVTT\nX-TIMESTAMP-MAP=MPEGTS:900000,LOCAL:00:00:00.000\n"));
}
