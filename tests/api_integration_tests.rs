//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::time::Duration;
use tiered_cache::{api::create_router, AppState, Config};
use tower::ServiceExt;

// == Helper Functions ==

fn test_config() -> Config {
    Config {
        tiers: "l1=4KB,l2=64KB".to_string(),
        ..Config::default()
    }
}

fn create_test_app() -> Router {
    let state = AppState::from_config(&test_config()).unwrap();
    create_router(state)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn put_json(body: Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri("/set")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

// == SET Endpoint Tests ==

#[tokio::test]
async fn test_set_endpoint_success() {
    let app = create_test_app();

    let response = app
        .oneshot(put_json(json!({"key": "test_key", "value": "test_value"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert!(json["message"].as_str().unwrap().contains("test_key"));
    assert_eq!(json["placement"]["target_tiers"], json!(["l1"]));
    assert_eq!(json["placement"]["ttl"], 3600);
}

#[tokio::test]
async fn test_set_endpoint_critical_replicates() {
    let app = create_test_app();

    let response = app
        .oneshot(put_json(json!({
            "key": "contract:7",
            "value": {"status": "signed"},
            "ttl": 60,
            "importance": "critical"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["placement"]["target_tiers"], json!(["l1", "l2"]));
    assert_eq!(json["placement"]["replicate"], true);
    assert_eq!(json["placement"]["ttl"], 60);
}

#[tokio::test]
async fn test_set_endpoint_empty_key() {
    let app = create_test_app();

    let response = app
        .oneshot(put_json(json!({"key": "", "value": "v"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert!(json.get("error").is_some());
}

#[tokio::test]
async fn test_set_endpoint_value_too_large() {
    let app = create_test_app();

    let response = app
        .oneshot(put_json(json!({"key": "big", "value": "x".repeat(70_000)})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_set_endpoint_value_too_large_for_l1_goes_to_l2() {
    let app = create_test_app();

    let response = app
        .clone()
        .oneshot(put_json(json!({"key": "wide", "value": "x".repeat(5000)})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["placement"]["target_tiers"], json!(["l2"]));

    let response = app.oneshot(get("/get/wide")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["tier"], "l2");
}

#[tokio::test]
async fn test_set_endpoint_huge_ttl() {
    let app = create_test_app();

    let response = app
        .clone()
        .oneshot(put_json(json!({"key": "long", "value": "v", "ttl": 184467440737095516u64})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/get/long")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_repeated_oversized_sets_keep_tiers_reachable() {
    let app = create_test_app();

    app.clone()
        .oneshot(put_json(json!({"key": "good", "value": "kept"})))
        .await
        .unwrap();

    for i in 0..6 {
        let response = app
            .clone()
            .oneshot(put_json(json!({"key": format!("big{}", i), "value": "x".repeat(70_000)})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    let response = app.clone().oneshot(get("/get/good")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(app.oneshot(get("/stats")).await.unwrap().into_body()).await;
    assert_eq!(json["tiers"][0]["circuit"]["state"], "closed");
}

#[tokio::test]
async fn test_set_endpoint_malformed_json() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/set")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"key": "k""#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

// == GET Endpoint Tests ==

#[tokio::test]
async fn test_get_endpoint_success() {
    let app = create_test_app();

    let set_response = app
        .clone()
        .oneshot(put_json(json!({"key": "get_key", "value": [1, 2, 3]})))
        .await
        .unwrap();
    assert_eq!(set_response.status(), StatusCode::OK);

    let get_response = app.oneshot(get("/get/get_key")).await.unwrap();

    assert_eq!(get_response.status(), StatusCode::OK);
    let json = body_to_json(get_response.into_body()).await;
    assert_eq!(json["key"], "get_key");
    assert_eq!(json["value"], json!([1, 2, 3]));
    assert_eq!(json["tier"], "l1");
}

#[tokio::test]
async fn test_get_endpoint_not_found() {
    let app = create_test_app();

    let response = app.oneshot(get("/get/missing")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_endpoint_expired() {
    let app = create_test_app();

    app.clone()
        .oneshot(put_json(json!({"key": "short", "value": "v", "ttl": 1})))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(1100)).await;

    let response = app.oneshot(get("/get/short")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// == DELETE Endpoint Tests ==

#[tokio::test]
async fn test_delete_endpoint() {
    let app = create_test_app();

    app.clone()
        .oneshot(put_json(json!({"key": "del_key", "value": "v"})))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/del/del_key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/get/del_key")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_endpoint_not_found() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/del/never_set")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// == STATS Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint_tracks_tiers() {
    let app = create_test_app();

    app.clone()
        .oneshot(put_json(json!({"key": "s", "value": "v"})))
        .await
        .unwrap();
    app.clone().oneshot(get("/get/s")).await.unwrap();
    app.clone().oneshot(get("/get/nope")).await.unwrap();

    let response = app.oneshot(get("/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    let tiers = json["tiers"].as_array().unwrap();
    assert_eq!(tiers.len(), 2);

    // "s" hits l1; "nope" misses l1 and l2
    assert_eq!(tiers[0]["tier"], "l1");
    assert_eq!(tiers[0]["stats"]["hits"], 1);
    assert_eq!(tiers[0]["stats"]["misses"], 1);
    assert_eq!(tiers[0]["hit_rate"], 0.5);
    assert_eq!(tiers[0]["stats"]["item_count"], 1);
    assert_eq!(tiers[1]["stats"]["misses"], 1);
    assert_eq!(tiers[0]["circuit"]["state"], "closed");
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 2);
}

// == HEALTH Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
}

// == Live Server ==

#[tokio::test]
async fn test_live_server_roundtrip() {
    let app = create_test_app();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::new();
    let base = format!("http://{}", addr);

    let response = client
        .put(format!("{}/set", base))
        .json(&json!({"key": "live", "value": {"ok": true}}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let body: Value = client
        .get(format!("{}/get/live", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["value"], json!({"ok": true}));

    let response = client
        .post(format!("{}/clear", base))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let response = client.get(format!("{}/get/live", base)).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    server.abort();
}
