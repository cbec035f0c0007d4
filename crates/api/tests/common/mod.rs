#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use storyline_core::media::LocalMediaStore;
use tower::ServiceExt;

use storyline_api::config::ServerConfig;
use storyline_api::router::build_app_router;
use storyline_api::state::AppState;

pub const UPLOAD_TOKEN: &str = "test-upload-token";
pub const MEDIA_BASE_URL: &str = "http://localhost:3000/media";

/// Build a test `ServerConfig` with safe defaults and a fresh media root.
pub fn test_config() -> ServerConfig {
    let media_root: PathBuf =
        std::env::temp_dir().join(format!("storyline-media-{}", uuid::Uuid::new_v4()));
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        upload_token: Some(UPLOAD_TOKEN.to_string()),
        media_root,
        media_base_url: MEDIA_BASE_URL.to_string(),
    }
}

/// Build the full application router with the production middleware stack.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, test_config())
}

pub fn build_test_app_with(pool: PgPool, config: ServerConfig) -> Router {
    let media = LocalMediaStore::new(&config.media_root, &config.media_base_url);
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        media: Arc::new(media),
        http: reqwest::Client::new(),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Request::delete(uri).body(Body::empty()).unwrap()).await
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, json_request("POST", uri, body)).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, json_request("PUT", uri, body)).await
}

pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    send(app, Request::post(uri).body(Body::empty()).unwrap()).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Multipart body with one file part and any number of text parts.
pub fn multipart_request(
    uri: &str,
    token: Option<&str>,
    file: (&str, &str, &[u8]),
    fields: &[(&str, &str)],
) -> Request<Body> {
    let boundary = "storyline-test-boundary";
    let (filename, content_type, data) = file;
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let mut builder = Request::post(uri).header(
        "content-type",
        format!("multipart/form-data; boundary={boundary}"),
    );
    if let Some(token) = token {
        builder = builder.header("x-upload-token", token);
    }
    builder.body(Body::from(body)).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Create a story and return its id.
pub async fn create_story(pool: &PgPool, title: &str) -> i64 {
    let response = post_json(
        build_test_app(pool.clone()),
        "/api/v1/stories",
        serde_json::json!({ "title": title, "recipient_name": "Sam" }),
    )
    .await;
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Create a chapter, fill in its editor form and return its id.
pub async fn create_chapter(pool: &PgPool, story_id: i64, form: serde_json::Value) -> i64 {
    let response = post_json(
        build_test_app(pool.clone()),
        &format!("/api/v1/stories/{story_id}/chapters"),
        serde_json::json!({}),
    )
    .await;
    let id = body_json(response).await["data"]["id"].as_i64().unwrap();
    let response = put_json(
        build_test_app(pool.clone()),
        &format!("/api/v1/stories/{story_id}/chapters/{id}"),
        form,
    )
    .await;
    assert!(response.status().is_success(), "chapter form rejected");
    id
}

/// A story with two chapters and a text final message, published. Returns
/// `(story_id, chapter_ids, slug)`.
pub async fn published_story(pool: &PgPool) -> (i64, Vec<i64>, String) {
    let story_id = create_story(pool, "Our Story").await;
    let c1 = create_chapter(
        pool,
        story_id,
        serde_json::json!({
            "paragraph_text": "We met by the sea.",
            "prompt": {
                "type": "multiple_choice",
                "config": {
                    "question": "Where?",
                    "options": ["the beach", "a cafe"],
                    "integration_template": "You chose [choice]."
                }
            }
        }),
    )
    .await;
    let c2 = create_chapter(
        pool,
        story_id,
        serde_json::json!({
            "paragraph_text": "And then?",
            "prompt": { "type": "text_input", "config": { "prompt": "Tell me" } }
        }),
    )
    .await;
    put_json(
        build_test_app(pool.clone()),
        &format!("/api/v1/stories/{story_id}/final-message"),
        serde_json::json!({ "final_message": { "type": "text", "content": "Always" } }),
    )
    .await;
    let response = post_empty(
        build_test_app(pool.clone()),
        &format!("/api/v1/stories/{story_id}/publish"),
    )
    .await;
    let slug = body_json(response).await["data"]["slug"]
        .as_str()
        .unwrap()
        .to_string();
    (story_id, vec![c1, c2], slug)
}
