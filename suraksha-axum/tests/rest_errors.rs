use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderValue, Request};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use suraksha_axum::{axum, ApiState, AxumApp};
use suraksha_blob::{MediaAdapter, MediaConfig, MemoryMediaStore};
use suraksha_stories::{MemoryStoryStore, StoryRules, StoryService};
use tower::ServiceExt;

fn app() -> AxumApp {
    let service = StoryService::new(Arc::new(MemoryStoryStore::new()), StoryRules::default())
        .with_media(MediaAdapter::new(MemoryMediaStore::new(), MediaConfig::default()));
    axum(ApiState::new(service))
}

fn request(method: &str, uri: &str, role: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-actor-id", "student-1")
        .header("x-actor-role", role)
        .header("content-type", "application/json");
    match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn malformed_json_returns_bad_request() {
    let res = app()
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/stories")
                .header("x-actor-id", "student-1")
                .header("content-type", "application/json")
                .body(Body::from("{\"content\":\"x\""))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 400);
    assert!(res.headers().get("x-request-id").is_some());
    let body = json_body(res).await;
    assert_eq!(body["name"], "BadRequest");
    assert_eq!(body["code"], 400);
    assert_eq!(body["className"], "bad-request");
    assert!(body.get("errors").is_some());
}

#[tokio::test]
async fn request_id_is_preserved_when_provided() {
    let provided = HeaderValue::from_static("req-test-123");
    let res = app()
        .router
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", provided.clone())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 200);
    assert_eq!(res.headers().get("x-request-id").unwrap(), &provided);
}

#[tokio::test]
async fn missing_identity_is_not_authenticated() {
    let res = app()
        .router
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/stories")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 401);
    assert_eq!(json_body(res).await["name"], "NotAuthenticated");
}

#[tokio::test]
async fn only_students_write() {
    let res = app()
        .router
        .oneshot(request(
            "POST",
            "/stories",
            "parent",
            Some(json!({ "content": "Not mine to tell" })),
        ))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 403);
    assert_eq!(json_body(res).await["className"], "forbidden");
}

#[tokio::test]
async fn validation_errors_list_fields() {
    let res = app()
        .router
        .oneshot(request(
            "POST",
            "/stories",
            "student",
            Some(json!({ "isChunk": true, "chunkIndex": "-1", "totalChunks": 2, "content": "x" })),
        ))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 400);
    let body = json_body(res).await;
    assert_eq!(body["message"], "Validation Error");
    assert_eq!(body["errors"]["chunkIndex"][0], "chunkIndex must be >= 0");
}

#[tokio::test]
async fn out_of_order_chunk_is_a_conflict_with_expected_index() {
    let ax = app();

    let res = ax
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/stories",
            "student",
            Some(json!({ "isChunk": true, "chunkIndex": 0, "totalChunks": 3, "content": "a" })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 201);
    let story_id = json_body(res).await["storyId"].as_str().unwrap().to_string();

    let res = ax
        .router
        .oneshot(request(
            "POST",
            "/stories",
            "student",
            Some(json!({
                "isChunk": true,
                "chunkIndex": 2,
                "totalChunks": 3,
                "storyId": story_id,
                "content": "c",
            })),
        ))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 409);
    let body = json_body(res).await;
    assert_eq!(body["name"], "Conflict");
    assert_eq!(body["data"]["expectedChunkIndex"], 1);
}

#[tokio::test]
async fn unknown_story_is_not_found() {
    let uri = format!("/stories/{}", suraksha_stories::StoryId::new());
    let res = app()
        .router
        .oneshot(request("PUT", &uri, "student", Some(json!({ "title": "Lost story" }))))
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 404);
    assert_eq!(json_body(res).await["name"], "NotFound");
}

#[tokio::test]
async fn presign_rejects_unsupported_types() {
    let ax = app();

    let res = ax
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/uploads/presign",
            "student",
            Some(json!({ "fileType": "image/png" })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 200);
    let body = json_body(res).await;
    assert!(body["objectUrl"]
        .as_str()
        .unwrap()
        .contains("/Uploads/Story-Images/image-"));
    assert!(body["presignedUrl"].is_string());

    let res = ax
        .router
        .oneshot(request(
            "POST",
            "/uploads/presign",
            "student",
            Some(json!({ "fileType": "application/zip" })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status().as_u16(), 400);
}
