mod support;

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use homing::infra::http::{BUSY_MESSAGE, HttpState, build_router};
use support::{Harness, MemorySource, RecordingBlog, document, paragraph};
use tokio::sync::Notify;
use tower::ServiceExt;

fn router(harness: &Harness) -> (Router, Arc<homing::application::publish::Publisher>) {
    let publisher = Arc::new(harness.live());
    let app = build_router(HttpState {
        publisher: publisher.clone(),
    });
    (app, publisher)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should collect");
    (status, String::from_utf8_lossy(&body).into_owned())
}

#[tokio::test]
async fn health_returns_no_content() {
    let (app, _) = router(&Harness::new());
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
}

#[tokio::test]
async fn manual_run_publishes_and_updates_status_page() {
    let harness = Harness::new();
    harness
        .source
        .add(document("doc-1", "Hello", &["blog"]), vec![paragraph("p1", "Hello")])
        .await;
    let (app, _) = router(&harness);

    let (status, page) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("not yet"));

    let (status, body) = get(&app, "/run").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Done!");
    assert!(harness.source.released("doc-1").await);

    let (_, page) = get(&app, "/").await;
    assert!(!page.contains("not yet"));
    assert!(page.contains("Released: 1"));
    assert!(page.contains("blog, social, forum, markdown"));
}

#[tokio::test]
async fn manual_run_while_busy_is_rejected() {
    let gate = Arc::new(Notify::new());
    let harness = Harness::with_parts(
        Arc::new(MemorySource::gated(gate.clone())),
        Arc::new(RecordingBlog::default()),
    );
    let (app, publisher) = router(&harness);

    let background = tokio::spawn({
        let publisher = publisher.clone();
        async move { publisher.trigger().await }
    });
    while !publisher.is_running() {
        tokio::task::yield_now().await;
    }

    let (status, body) = get(&app, "/run").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, BUSY_MESSAGE);

    let (_, page) = get(&app, "/").await;
    assert!(page.contains("A run is in progress."));

    gate.notify_one();
    background
        .await
        .expect("join")
        .expect("background run completes");
}
