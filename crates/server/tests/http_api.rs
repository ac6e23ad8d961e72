//! REST surface tests driven through the full router.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::util::ServiceExt;

use server::config::{AppState, ServerConfig};
use server::store::{DocumentStore, MemoryStore};

fn create_app() -> (axum::Router, AppState) {
    let state = AppState::new(Arc::new(MemoryStore::new()), ServerConfig::default());
    (server::app(state.clone()), state)
}

async fn body_to_json(body: Body) -> serde_json::Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _state) = create_app();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_document_returns_id_and_editor_url() {
    let (app, state) = create_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/docs")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"title":"Launch Plan"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_to_json(response.into_body()).await;
    let id = json["id"].as_str().unwrap();
    assert!(!id.is_empty());
    assert_eq!(json["url"], format!("/doc.html?id={id}"));

    let doc = state.store.load(id).await.unwrap().unwrap();
    assert_eq!(doc.title, "Launch Plan");
}

#[tokio::test]
async fn test_create_document_without_body_defaults_title() {
    let (app, state) = create_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/docs")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_to_json(response.into_body()).await;
    let id = json["id"].as_str().unwrap();

    let doc = state.store.load(id).await.unwrap().unwrap();
    assert_eq!(doc.title, "Untitled");
    assert_eq!(doc.content, "");
    assert_eq!(doc.version, 0);
}

#[tokio::test]
async fn test_get_document_round_trip() {
    let (app, state) = create_app();
    let doc = state.store.create("Roadmap").await.unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/docs/{}", doc.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["id"], doc.id.as_str());
    assert_eq!(json["title"], "Roadmap");
    assert_eq!(json["version"], 0);
    assert!(json["updatedAt"].is_i64() || json["updatedAt"].is_u64());
}

#[tokio::test]
async fn test_get_missing_document_is_404_with_error_body() {
    let (app, _state) = create_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/docs/no-such-doc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    let message = json["error"]["message"].as_str().unwrap();
    assert!(message.contains("no-such-doc"), "unexpected body: {json}");
}
