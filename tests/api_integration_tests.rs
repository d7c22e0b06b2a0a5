//! Integration Tests for API Endpoints
//!
//! Tests the full request/response cycle against a temporary storage root.

use std::fs;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use vfs_server::{create_router, worker::WorkerPool, AppState, Config};

// == Helper Functions ==

struct TestApp {
    storage: TempDir,
    _mounts: TempDir,
    app: Router,
}

fn create_test_app() -> TestApp {
    create_test_app_with(|_| {})
}

fn create_test_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let storage = TempDir::new().unwrap();
    fs::create_dir(storage.path().join("docs")).unwrap();
    fs::write(storage.path().join("docs/readme.md"), "# readme\n").unwrap();
    fs::write(storage.path().join("docs/todo.txt"), "milk").unwrap();

    let mounts = TempDir::new().unwrap();
    let media = mounts.path().join("media");
    fs::create_dir(&media).unwrap();
    fs::write(media.join("song.mp3"), "id3").unwrap();

    let mut config = Config::with_storage(storage.path());
    config.mount_dirs.push(media);
    configure(&mut config);
    let state = AppState::with_pool(config, WorkerPool::with_workers(2));

    TestApp {
        storage,
        _mounts: mounts,
        app: create_router(state),
    }
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

const BOUNDARY: &str = "vfs-test-boundary";

fn multipart_upload(uri: &str, files: &[(&str, &[u8])]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, content) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn names(json: &Value) -> Vec<String> {
    json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["name"].as_str().unwrap().to_string())
        .collect()
}

// == Listing Tests ==

#[tokio::test]
async fn test_root_listing_includes_mounts() {
    let t = create_test_app();

    let response = t.app.oneshot(get("/api/files?path=/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["success"], true);
    assert_eq!(names(&json), ["media", "docs"]);
    assert_eq!(json["data"][0]["is_mount"], true);
    assert_eq!(json["data"][0]["path"], "/media");
}

#[tokio::test]
async fn test_listing_etag_round_trip() {
    let t = create_test_app();

    let first = t.app.clone().oneshot(get("/api/files?path=/docs")).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let etag = first.headers()[header::ETAG].clone();

    // Unchanged directory: 304 with no body.
    let cached = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/files?path=/docs")
                .header(header::IF_NONE_MATCH, etag.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(cached.status(), StatusCode::NOT_MODIFIED);

    // A new file changes the fingerprint, so the old tag no longer matches.
    fs::write(t.storage.path().join("docs/new.txt"), "").unwrap();
    let fresh = t
        .app
        .oneshot(
            Request::builder()
                .uri("/api/files?path=/docs")
                .header(header::IF_NONE_MATCH, etag.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(fresh.status(), StatusCode::OK);
    assert_ne!(fresh.headers()[header::ETAG], etag);
    let json = body_to_json(fresh.into_body()).await;
    assert_eq!(names(&json), ["new.txt", "readme.md", "todo.txt"]);
}

#[tokio::test]
async fn test_listing_missing_directory() {
    let t = create_test_app();
    let response = t.app.oneshot(get("/api/files?path=/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_listing_rejects_traversal() {
    let t = create_test_app();
    let response = t
        .app
        .oneshot(get("/api/files?path=/../../etc"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// == Content Tests ==

#[tokio::test]
async fn test_content_from_mount() {
    let t = create_test_app();
    let response = t
        .app
        .oneshot(get("/api/files/content?path=/media/song.mp3"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["data"]["content"], "id3");
    assert_eq!(json["data"]["path"], "/media/song.mp3");
}

#[tokio::test]
async fn test_save_then_read() {
    let t = create_test_app();

    let saved = t
        .app
        .clone()
        .oneshot(post(
            "/api/files/save",
            json!({"path": "/docs/todo.txt", "content": "eggs"}),
        ))
        .await
        .unwrap();
    assert_eq!(saved.status(), StatusCode::OK);

    let response = t
        .app
        .oneshot(get("/api/files/content?path=/docs/todo.txt"))
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["data"]["content"], "eggs");
}

#[tokio::test]
async fn test_save_rejects_parent_segments() {
    let t = create_test_app();
    let response = t
        .app
        .oneshot(post(
            "/api/files/save",
            json!({"path": "/docs/../../escape.txt", "content": "x"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(!t.storage.path().parent().unwrap().join("escape.txt").exists());
}

#[tokio::test]
async fn test_save_larger_than_default_body_limit() {
    let t = create_test_app();
    let content = "x".repeat(3 * 1024 * 1024);

    let response = t
        .app
        .oneshot(post(
            "/api/files/save",
            json!({"path": "/docs/big.txt", "content": content}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let written = fs::metadata(t.storage.path().join("docs/big.txt")).unwrap();
    assert_eq!(written.len(), 3 * 1024 * 1024);
}

// == Download / Upload Tests ==

#[tokio::test]
async fn test_download_streams_mount_file() {
    let t = create_test_app();
    let response = t
        .app
        .oneshot(get("/api/files/download?path=/media/song.mp3"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
    assert_eq!(response.headers()[header::CONTENT_LENGTH], "3");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "inline; filename=\"song.mp3\""
    );

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"id3");
}

#[tokio::test]
async fn test_download_errors() {
    let t = create_test_app();

    let missing = t
        .app
        .clone()
        .oneshot(get("/api/files/download?path=/docs/nope.bin"))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let directory = t
        .app
        .clone()
        .oneshot(get("/api/files/download?path=/docs"))
        .await
        .unwrap();
    assert_eq!(directory.status(), StatusCode::BAD_REQUEST);

    let escape = t
        .app
        .oneshot(get("/api/files/download?path=/docs/../../etc/passwd"))
        .await
        .unwrap();
    assert_eq!(escape.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_stores_files_and_refreshes_listing() {
    let t = create_test_app();

    // Prime the listing cache so the upload has something to invalidate.
    let before = t.app.clone().oneshot(get("/api/files?path=/docs")).await.unwrap();
    let json = body_to_json(before.into_body()).await;
    assert_eq!(names(&json), vec!["readme.md", "todo.txt"]);

    let response = t
        .app
        .clone()
        .oneshot(multipart_upload(
            "/api/files/upload?path=/docs",
            &[
                ("photo.png", &[0x89, b'P', b'N', b'G'][..]),
                ("notes.txt", &b"hello"[..]),
            ],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"][0]["path"], "/docs/photo.png");
    assert_eq!(json["data"][0]["size"], 4);
    assert_eq!(json["data"][1]["path"], "/docs/notes.txt");

    assert_eq!(
        fs::read(t.storage.path().join("docs/photo.png")).unwrap(),
        vec![0x89, b'P', b'N', b'G']
    );
    assert_eq!(
        fs::read_to_string(t.storage.path().join("docs/notes.txt")).unwrap(),
        "hello"
    );

    let after = t.app.oneshot(get("/api/files?path=/docs")).await.unwrap();
    let json = body_to_json(after.into_body()).await;
    assert_eq!(
        names(&json),
        vec!["notes.txt", "photo.png", "readme.md", "todo.txt"]
    );
}

#[tokio::test]
async fn test_upload_over_limit_leaves_nothing_behind() {
    let t = create_test_app_with(|config| config.max_file_size = 8);

    let response = t
        .app
        .oneshot(multipart_upload(
            "/api/files/upload?path=/docs",
            &[("big.bin", &[7u8; 64][..])],
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(!t.storage.path().join("docs/big.bin").exists());
}

#[tokio::test]
async fn test_upload_without_files() {
    let t = create_test_app();
    let response = t
        .app
        .oneshot(multipart_upload("/api/files/upload?path=/docs", &[]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// == Create / Mkdir / Move Tests ==

#[tokio::test]
async fn test_create_file_defaults_and_conflict() {
    let t = create_test_app();

    let created = t
        .app
        .clone()
        .oneshot(post("/api/files/create", json!({"path": "/docs", "name": "plan"})))
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);
    assert_eq!(
        fs::read_to_string(t.storage.path().join("docs/plan.md")).unwrap(),
        "# plan\n\n"
    );

    let again = t
        .app
        .oneshot(post("/api/files/create", json!({"path": "/docs", "name": "plan"})))
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_mkdir_rejects_nested_name() {
    let t = create_test_app();
    let response = t
        .app
        .oneshot(post("/api/files/mkdir", json!({"path": "/", "name": "a/b"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_mkdir_then_move_into_it() {
    let t = create_test_app();

    let made = t
        .app
        .clone()
        .oneshot(post("/api/files/mkdir", json!({"path": "/docs", "name": "archive"})))
        .await
        .unwrap();
    assert_eq!(made.status(), StatusCode::CREATED);

    let moved = t
        .app
        .clone()
        .oneshot(post(
            "/api/files/move",
            json!({"sourcePath": "/docs/todo.txt", "targetPath": "/docs/archive/todo.txt"}),
        ))
        .await
        .unwrap();
    assert_eq!(moved.status(), StatusCode::OK);
    assert!(t.storage.path().join("docs/archive/todo.txt").exists());

    let listing = t.app.oneshot(get("/api/files?path=/docs")).await.unwrap();
    let json = body_to_json(listing.into_body()).await;
    assert_eq!(names(&json), ["archive", "readme.md"]);
}

#[tokio::test]
async fn test_move_to_missing_directory() {
    let t = create_test_app();
    let response = t
        .app
        .oneshot(post(
            "/api/files/move",
            json!({"sourcePath": "/docs/todo.txt", "targetPath": "/nowhere/todo.txt"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(t.storage.path().join("docs/todo.txt").exists());
}

// == Batch Delete Tests ==

#[tokio::test]
async fn test_batch_delete() {
    let t = create_test_app();
    let response = t
        .app
        .oneshot(post(
            "/api/files/batch-delete",
            json!({"paths": ["/docs/todo.txt", "/docs/readme.md"]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["data"]["deleted"], 2);
    assert!(fs::read_dir(t.storage.path().join("docs")).unwrap().next().is_none());
}

#[tokio::test]
async fn test_batch_delete_reports_failures() {
    let t = create_test_app();
    let response = t
        .app
        .oneshot(post(
            "/api/files/batch-delete",
            json!({"paths": ["/docs/todo.txt", "/"]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["data"]["deleted"], 1);
    assert_eq!(json["data"]["failed"][0]["path"], "/");
    assert!(t.storage.path().exists());
}

// == Search Tests ==

#[tokio::test]
async fn test_search_scopes() {
    let t = create_test_app();

    let current = t
        .app
        .clone()
        .oneshot(post("/api/search", json!({"term": "TODO", "path": "/"})))
        .await
        .unwrap();
    let json = body_to_json(current.into_body()).await;
    assert!(json["data"].as_array().unwrap().is_empty());

    let recursive = t
        .app
        .oneshot(post(
            "/api/search",
            json!({"term": "todo", "path": "/", "scope": "recursive"}),
        ))
        .await
        .unwrap();
    let json = body_to_json(recursive.into_body()).await;
    assert_eq!(json["data"][0]["path"], "/docs/todo.txt");
}

#[tokio::test]
async fn test_search_invalid_regex() {
    let t = create_test_app();
    let response = t
        .app
        .oneshot(post("/api/search", json!({"term": "(", "useRegex": true})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// == System Tests ==

#[tokio::test]
async fn test_health_and_stats() {
    let t = create_test_app();

    let health = t.app.clone().oneshot(get("/api/health")).await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);
    let json = body_to_json(health.into_body()).await;
    assert_eq!(json["status"], "healthy");
    assert!(json["cache_stats"]["entries"].is_u64());

    t.app.clone().oneshot(get("/api/files?path=/docs")).await.unwrap();
    t.app.clone().oneshot(get("/api/files?path=/docs")).await.unwrap();

    let stats = t.app.oneshot(get("/api/stats")).await.unwrap();
    let json = body_to_json(stats.into_body()).await;
    assert_eq!(json["data"]["cache"]["hits"], 1);
    assert_eq!(json["data"]["cache"]["entries"], 1);
    assert_eq!(json["data"]["workers"], 2);
}

#[tokio::test]
async fn test_config_and_specific_dirs() {
    let t = create_test_app();

    let config = t.app.clone().oneshot(get("/api/config")).await.unwrap();
    let json = body_to_json(config.into_body()).await;
    assert_eq!(json["data"]["mount_dirs"].as_array().unwrap().len(), 1);

    let dirs = t.app.oneshot(get("/api/specific-dirs")).await.unwrap();
    let json = body_to_json(dirs.into_body()).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}
