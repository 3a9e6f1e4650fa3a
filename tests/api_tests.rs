use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

use pixarr::api::AppState;
use pixarr::config::Config;
use pixarr::db::SearchPayload;

/// Default API key seeded by migration (must match m20250902_initial.rs)
const DEFAULT_API_KEY: &str = "pixarr_default_api_key_please_regenerate";

/// Seeded admin user id
const ADMIN_USER_ID: i32 = 1;

fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.pixabay.api_key = "test-key".to_string();
    config
}

async fn spawn_app() -> Router {
    let (app, _state) = spawn_app_with_state().await;
    app
}

async fn spawn_app_with_state() -> (Router, Arc<AppState>) {
    let state = pixarr::api::create_app_state_from_config(test_config())
        .await
        .expect("Failed to create app state");
    let app = pixarr::api::router(state.clone()).await;
    (app, state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_auth_endpoints() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/search/history")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/search/history")
                .header("X-Api-Key", "wrong-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/search/history")
                .header("X-Api-Key", DEFAULT_API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    // Bearer form works too
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/system/status")
                .header("Authorization", format!("Bearer {DEFAULT_API_KEY}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_search_requires_query() {
    let app = spawn_app().await;

    for uri in ["/api/v1/search/image", "/api/v1/search/image?search="] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .header("X-Api-Key", DEFAULT_API_KEY)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["kind"], "invalid_request");
        assert!(body["message"].is_string());
    }
}

#[tokio::test]
async fn test_history_empty_for_new_user() {
    let app = spawn_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/search/history")
                .header("X-Api-Key", DEFAULT_API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn test_cached_search_is_served_over_http() {
    let (app, state) = spawn_app_with_state().await;

    let mut tags = HashMap::new();
    tags.insert(101, vec!["cat".to_string(), "pet".to_string()]);
    tags.insert(102, vec!["cat".to_string(), "kitten".to_string()]);
    let payload = SearchPayload {
        image_ids: vec![101, 102, 103],
        tags,
    };

    state
        .store()
        .upsert_search_record(ADMIN_USER_ID, "cats", &payload, chrono::Duration::days(3))
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/search/image?search=cats")
                .header("X-Api-Key", DEFAULT_API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["source"], "cache");
    assert_eq!(body["attribution"], "Images from Pixabay");

    let images = body["images"].as_array().unwrap();
    assert_eq!(images.len(), 3);
    assert_eq!(images[0]["id"], 101);
    assert_eq!(images[1]["id"], 102);
    assert_eq!(images[2]["id"], 103);
    assert_eq!(
        images[0]["webformatURL"],
        "https://pixabay.com/get/101_640.jpg"
    );
    assert_eq!(
        images[0]["previewURL"],
        "https://pixabay.com/get/101-180.jpg"
    );
    assert_eq!(images[0]["tags"], serde_json::json!(["cat", "pet"]));
    assert_eq!(images[2]["tags"], serde_json::json!([]));
}

#[tokio::test]
async fn test_history_lists_seeded_search() {
    let (app, state) = spawn_app_with_state().await;

    let mut tags = HashMap::new();
    tags.insert(101, vec!["cat".to_string()]);
    let payload = SearchPayload {
        image_ids: vec![101],
        tags,
    };

    state
        .store()
        .upsert_search_record(ADMIN_USER_ID, "cats", &payload, chrono::Duration::days(3))
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/search/history")
                .header("X-Api-Key", DEFAULT_API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["query"], "cats");
    assert!(entries[0]["date"].is_string());
    assert_eq!(
        entries[0]["images"][0]["thumbnail"],
        "https://pixabay.com/get/101-180.jpg"
    );
    assert_eq!(entries[0]["images"][0]["tags"], serde_json::json!(["cat"]));
}

#[tokio::test]
async fn test_signup_and_login_flow() {
    let app = spawn_app().await;

    let signup = serde_json::json!({
        "username": "nadia",
        "full_name": "Nadia K",
        "email": "nadia@example.com",
        "password": "correct horse"
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/signup")
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(&signup).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["username"], "nadia");
    let api_key = body["api_key"].as_str().unwrap().to_string();
    assert_eq!(api_key.len(), 64);

    // The fresh API key authenticates requests
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/auth/me")
                .header("X-Api-Key", &api_key)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["email"], "nadia@example.com");

    // Duplicate username is rejected
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/signup")
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(&signup).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);

    let login = serde_json::json!({
        "username": "nadia",
        "password": "correct horse"
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/login")
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(&login).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["api_key"], api_key);

    let bad_login = serde_json::json!({
        "username": "nadia",
        "password": "wrong password"
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/login")
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(&bad_login).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["kind"], "unauthorized");
}

#[tokio::test]
async fn test_signup_validation() {
    let app = spawn_app().await;

    let missing_fields = serde_json::json!({
        "username": "x",
        "full_name": "",
        "email": "x@example.com",
        "password": "long enough"
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/signup")
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(&missing_fields).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let short_password = serde_json::json!({
        "username": "x",
        "full_name": "X",
        "email": "x@example.com",
        "password": "short"
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/signup")
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_string(&short_password).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_system_status() {
    let app = spawn_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/system/status")
                .header("X-Api-Key", DEFAULT_API_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["database"], "ok");
    assert!(body["version"].is_string());
}
