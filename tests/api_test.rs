use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use tempfile::TempDir;
use tower::ServiceExt; // for `oneshot`

use faceswap::api::models::{MessageBody, SwapReady, UploadAccepted};
use faceswap::api::state::AppState;
use faceswap::config::Config;
use faceswap::media::MediaStore;
use faceswap::observability::Metrics;
use faceswap::queue::{self, TaskReceiver};
use faceswap::task::{SwapReport, TaskStore};

const BOUNDARY: &str = "faceswap-test-boundary";

struct TestContext {
    app: Router,
    store: TaskStore,
    receiver: TaskReceiver,
    results_dir: PathBuf,
    _temp_dir: TempDir,
}

/// Builds the router over tempfile-isolated state. No workers are spawned:
/// these tests drive the store directly to simulate worker outcomes.
fn build_test_app(queue_capacity: usize) -> TestContext {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let upload_dir = temp_dir.path().join("uploads");
    let results_dir = temp_dir.path().join("results");

    let config_toml = format!(
        r#"
[store]
path = "{}"

[queue]
capacity = {queue_capacity}

[media]
upload_dir = "{}"
results_dir = "{}"
public_url = "/media_result/"
        "#,
        temp_dir.path().join("tasks").display(),
        upload_dir.display(),
        results_dir.display(),
    );
    let config: Config = toml::from_str(&config_toml).expect("Failed to parse test config");

    let store = TaskStore::open(&config.store.path).expect("Failed to open test store");
    let media = MediaStore::open(&upload_dir, &results_dir, config.media.public_url.clone())
        .expect("Failed to open test media storage");

    let (task_queue, receiver) = queue::bounded(config.queue.capacity);

    let state = AppState::new(
        config,
        store.clone(),
        media,
        task_queue,
        Arc::new(Metrics::new()),
    );

    TestContext {
        app: faceswap::api::router(state),
        store,
        receiver,
        results_dir,
        _temp_dir: temp_dir,
    }
}

fn multipart_body(fields: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, data) in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(fields: &[(&str, &str, &[u8])]) -> Request<Body> {
    Request::builder()
        .uri("/upload_image")
        .method("POST")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(fields)))
        .unwrap()
}

fn result_request(id: &str) -> Request<Body> {
    Request::builder()
        .uri(format!("/result/{id}"))
        .method("GET")
        .body(Body::empty())
        .unwrap()
}

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_welcome_page() {
    let ctx = build_test_app(8);

    let response = ctx
        .app
        .oneshot(
            Request::builder()
                .uri("/")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"Welcome to the Faceswap API.");
}

#[tokio::test]
async fn test_upload_creates_pending_task_and_enqueues_it() {
    let ctx = build_test_app(8);

    let request = upload_request(&[
        ("source", "me.jpg", b"source-image-bytes"),
        ("target", "you.png", b"target-image-bytes"),
    ]);
    let response = ctx.app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let accepted: UploadAccepted = body_json(response).await;
    assert_eq!(accepted.msg, "file uploaded");
    assert!(!accepted.id.is_empty());

    // Record persisted as pending, extensions preserved.
    let task = ctx.store.get(&accepted.id).unwrap().unwrap();
    assert!(task.is_pending());
    assert!(task.source_path.ends_with(".jpg"));
    assert!(task.target_path.ends_with(".png"));

    // The id, and only the id, went onto the queue.
    assert_eq!(ctx.receiver.dequeue().await.unwrap(), accepted.id);
}

#[tokio::test]
async fn test_upload_missing_target_is_bad_request() {
    let ctx = build_test_app(8);

    let request = upload_request(&[("source", "me.jpg", b"source-image-bytes")]);
    let response = ctx.app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: MessageBody = body_json(response).await;
    assert!(body.msg.contains("source and target"));
}

#[tokio::test]
async fn test_upload_ignores_unknown_fields() {
    let ctx = build_test_app(8);

    let request = upload_request(&[
        ("decoy", "x.bin", b"junk"),
        ("source", "a.jpg", b"a"),
        ("target", "b.jpg", b"b"),
    ]);
    let response = ctx.app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_upload_rejected_when_queue_full() {
    let ctx = build_test_app(1);

    let first = ctx
        .app
        .clone()
        .oneshot(upload_request(&[
            ("source", "a.jpg", b"a"),
            ("target", "b.jpg", b"b"),
        ]))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    // No worker is draining; the single slot is taken.
    let second = ctx
        .app
        .oneshot(upload_request(&[
            ("source", "c.jpg", b"c"),
            ("target", "d.jpg", b"d"),
        ]))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: MessageBody = body_json(second).await;
    assert!(body.msg.contains("overloaded"));
}

#[tokio::test]
async fn test_result_rejects_malformed_id() {
    let ctx = build_test_app(8);

    let response = ctx
        .app
        .oneshot(result_request("definitely-not-a-uuid"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: MessageBody = body_json(response).await;
    assert_eq!(body.msg, "Invalid swap id.");
}

#[tokio::test]
async fn test_result_unknown_id_is_not_found() {
    let ctx = build_test_app(8);

    let response = ctx
        .app
        .oneshot(result_request("0192f0a1-1111-7222-8333-444455556666"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_result_pending_task_is_in_progress() {
    let ctx = build_test_app(8);
    let task = ctx.store.insert("a.jpg", "b.jpg").unwrap();

    let response = ctx.app.oneshot(result_request(&task.id)).await.unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body: MessageBody = body_json(response).await;
    assert_eq!(body.msg, "Swapping in progress.");
}

#[tokio::test]
async fn test_result_names_side_without_face() {
    let ctx = build_test_app(8);
    let task = ctx.store.insert("a.jpg", "b.jpg").unwrap();
    ctx.store
        .complete(&task.id, SwapReport::faces_not_found(false, true))
        .unwrap();

    let response = ctx.app.oneshot(result_request(&task.id)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: MessageBody = body_json(response).await;
    assert!(body.msg.contains("source"));
    assert!(!body.msg.contains("target"));
}

#[tokio::test]
async fn test_result_done_returns_result_url() {
    let ctx = build_test_app(8);
    let task = ctx.store.insert("a.jpg", "b.jpg").unwrap();
    ctx.store
        .complete(&task.id, SwapReport::done(format!("{}.jpg", task.id)))
        .unwrap();

    let response = ctx.app.oneshot(result_request(&task.id)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: SwapReady = body_json(response).await;
    assert_eq!(body.msg, "Swapping done!");
    assert_eq!(body.result_url, format!("/media_result/{}.jpg", task.id));
}

#[tokio::test]
async fn test_media_result_serves_stored_files() {
    let ctx = build_test_app(8);
    std::fs::write(ctx.results_dir.join("done.jpg"), b"jpeg-bytes").unwrap();

    let response = ctx
        .app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/media_result/done.jpg")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"jpeg-bytes");

    let missing = ctx
        .app
        .oneshot(
            Request::builder()
                .uri("/media_result/nope.jpg")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}
