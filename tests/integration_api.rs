//! API integration tests
//!
//! Tests for the HTTP endpoints using axum's test utilities.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use common::{count_files, multipart_body, TestHarness, CORRUPT_MARKER};
use sc_server::router::build_router;

/// Helper to get a response body as JSON
async fn body_json(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn upload_request(content_type: String, body: Vec<u8>) -> Request<Body> {
    Request::post("/api/convert")
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let harness = TestHarness::new();
    let app = build_router(harness.ctx.clone());

    let response = app
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let json = body_json(response.into_body()).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["port"], 9527);
    assert_eq!(json["isTermux"], false);
}

#[tokio::test]
async fn test_tools_endpoint_lists_known_tools() {
    let harness = TestHarness::new();
    let app = build_router(harness.ctx.clone());

    let response = app
        .oneshot(Request::get("/api/tools").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response.into_body()).await;
    let names: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["ffmpeg", "silk-encoder"]);
}

#[tokio::test]
async fn test_convert_success_streams_silk_and_cleans_up() {
    let harness = TestHarness::new();
    let app = build_router(harness.ctx.clone());

    let (ct, body) = multipart_body(
        Some(("audio", "Voice Note.MP3", b"ID3 audio".as_slice())),
        &[],
    );
    let response = app.oneshot(upload_request(ct, body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment;"));
    assert!(disposition.contains("filename=\"Voice Note.silk\""));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(sc_av::is_silk_stream(&bytes));
    assert_eq!(harness.transcoder.calls(), 1);

    assert_eq!(count_files(&harness.upload_dir()), 0);
}

#[tokio::test]
async fn test_convert_ignores_other_fields() {
    let harness = TestHarness::new();
    let app = build_router(harness.ctx.clone());

    let (ct, body) = multipart_body(
        Some(("audio", "clip.ogg", b"OggS".as_slice())),
        &[("comment", "hello")],
    );
    let response = app.oneshot(upload_request(ct, body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    response.into_body().collect().await.unwrap();
    assert_eq!(count_files(&harness.upload_dir()), 0);
}

#[tokio::test]
async fn test_convert_without_file_is_400() {
    let harness = TestHarness::new();
    let app = build_router(harness.ctx.clone());

    let (ct, body) = multipart_body(None, &[("audio", "not a file")]);
    let response = app.oneshot(upload_request(ct, body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("No audio file"));
    assert_eq!(harness.transcoder.calls(), 0);
}

#[tokio::test]
async fn test_convert_wrong_field_name_is_400() {
    let harness = TestHarness::new();
    let app = build_router(harness.ctx.clone());

    let (ct, body) = multipart_body(Some(("file", "clip.mp3", b"data".as_slice())), &[]);
    let response = app.oneshot(upload_request(ct, body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_convert_rejects_extension_before_any_tool_runs() {
    let harness = TestHarness::new();

    for name in ["notes.txt", "movie.mp4", "noextension"] {
        let app = build_router(harness.ctx.clone());
        let (ct, body) = multipart_body(Some(("audio", name, b"data".as_slice())), &[]);
        let response = app.oneshot(upload_request(ct, body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{name}");
        let json = body_json(response.into_body()).await;
        assert!(json["error"].as_str().unwrap().contains(".mp3"));
    }

    assert_eq!(harness.transcoder.calls(), 0);
    assert_eq!(count_files(&harness.upload_dir()), 0);
}

#[tokio::test]
async fn test_convert_accepts_every_supported_extension() {
    let harness = TestHarness::new();

    for ext in ["mp3", "wav", "ogg", "m4a", "flac", "aac", "WAV"] {
        let app = build_router(harness.ctx.clone());
        let name = format!("clip.{ext}");
        let (ct, body) = multipart_body(Some(("audio", &name, b"data".as_slice())), &[]);
        let response = app.oneshot(upload_request(ct, body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{name}");
        response.into_body().collect().await.unwrap();
    }

    assert_eq!(harness.transcoder.calls(), 7);
    assert_eq!(count_files(&harness.upload_dir()), 0);
}

#[tokio::test]
async fn test_convert_too_large_is_413() {
    let harness = TestHarness::with_config(|c| c.upload.max_bytes = 1024);
    let app = build_router(harness.ctx.clone());

    let data = vec![7u8; 4096];
    let (ct, body) = multipart_body(Some(("audio", "big.wav", data.as_slice())), &[]);
    let response = app.oneshot(upload_request(ct, body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let json = body_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("1024"));
    assert_eq!(harness.transcoder.calls(), 0);
    assert_eq!(count_files(&harness.upload_dir()), 0);
}

#[tokio::test]
async fn test_convert_failure_is_500_and_cleans_up() {
    let harness = TestHarness::new();
    let app = build_router(harness.ctx.clone());

    let (ct, body) = multipart_body(Some(("audio", "broken.m4a", CORRUPT_MARKER)), &[]);
    let response = app.oneshot(upload_request(ct, body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response.into_body()).await;
    let message = json["error"].as_str().unwrap();
    assert!(message.starts_with("conversion failed:"), "{message}");
    assert!(message.contains("Invalid data"));

    assert_eq!(harness.transcoder.calls(), 1);
    assert_eq!(count_files(&harness.upload_dir()), 0);
}

#[tokio::test]
async fn test_watch_status_start_stop() {
    let harness = TestHarness::new();

    let response = build_router(harness.ctx.clone())
        .oneshot(Request::get("/api/watch/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(response.into_body()).await;
    assert_eq!(json["enabled"], false);
    assert_eq!(json["isTermux"], false);
    assert_eq!(
        json["inputDir"],
        harness.input_dir().display().to_string().as_str()
    );
    assert_eq!(
        json["outputDir"],
        harness.output_dir().display().to_string().as_str()
    );

    let start = |h: &TestHarness| {
        build_router(h.ctx.clone())
            .oneshot(Request::post("/api/watch/start").body(Body::empty()).unwrap())
    };
    let stop = |h: &TestHarness| {
        build_router(h.ctx.clone())
            .oneshot(Request::post("/api/watch/stop").body(Body::empty()).unwrap())
    };

    let json = body_json(start(&harness).await.unwrap().into_body()).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["enabled"], true);
    assert!(harness.input_dir().is_dir());
    assert!(harness.output_dir().is_dir());

    let json = body_json(start(&harness).await.unwrap().into_body()).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["enabled"], true);

    let json = body_json(stop(&harness).await.unwrap().into_body()).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["enabled"], false);

    let json = body_json(stop(&harness).await.unwrap().into_body()).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["enabled"], false);
}
