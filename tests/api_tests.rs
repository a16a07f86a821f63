// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP API tests over the in-memory store.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use streakboard::time_utils::today;
use tower::ServiceExt;

mod common;

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
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

#[tokio::test]
async fn test_health() {
    let (app, _, _) = common::create_test_app();

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_record_visit_twice_same_day() {
    let (app, _, _) = common::create_test_app();

    let first = app
        .clone()
        .oneshot(post_json("/api/visits", json!({ "user_id": "alice" })))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let body = common::body_json(first).await;
    assert_eq!(body["already_recorded"], false);
    assert_eq!(body["streak"]["current_streak"], 1);

    let second = app
        .clone()
        .oneshot(post_json("/api/visits", json!({ "user_id": "alice" })))
        .await
        .unwrap();
    let body = common::body_json(second).await;
    assert_eq!(body["already_recorded"], true);
    assert_eq!(body["streak"]["current_streak"], 1);

    let streak = app.oneshot(get("/api/streaks/alice")).await.unwrap();
    assert_eq!(streak.status(), StatusCode::OK);
    let body = common::body_json(streak).await;
    assert_eq!(body["longest_streak"], 1);
    assert_eq!(body["last_visit_date"], today().to_string());
}

#[tokio::test]
async fn test_empty_user_id_is_bad_request() {
    let (app, _, _) = common::create_test_app();

    let response = app
        .clone()
        .oneshot(post_json("/api/visits", json!({ "user_id": "" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(post_json("/api/visits", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_incorrect_answer_does_not_count() {
    let (app, _, _) = common::create_test_app();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/answers",
            json!({ "user_id": "bob", "is_correct": false }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["counted"], false);

    let response = app.oneshot(get("/api/streaks/bob")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = common::body_json(response).await;
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_ranking_clamps_parameters() {
    let (app, _, store) = common::create_test_app();
    let today = today();
    for i in 0..3 {
        store.put_streak(common::streak(&format!("user{}", i), i + 1, today));
    }

    let response = app
        .clone()
        .oneshot(get("/api/ranking?page=0&per_page=1000"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["per_page"], 100);
    assert_eq!(body["entries"].as_array().unwrap().len(), 3);
    assert_eq!(body["entries"][0]["user_id"], "user2");

    let response = app
        .clone()
        .oneshot(get("/api/ranking?page=abc&per_page=-5"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["per_page"], 1);
    assert_eq!(body["pagination"]["total_pages"], 3);
    assert_eq!(body["pagination"]["has_next"], true);

    let response = app
        .oneshot(get("/api/ranking/top?limit=999"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    let ranks: Vec<u64> = body["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["rank_position"].as_u64().unwrap())
        .collect();
    assert_eq!(ranks, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_user_rank_not_found() {
    let (app, _, _) = common::create_test_app();

    let response = app
        .oneshot(get("/api/ranking/users/ghost"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_month_is_bad_request() {
    let (app, _, _) = common::create_test_app();

    let response = app
        .oneshot(get("/api/visits/alice/months/2024/13"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_reset_requires_token() {
    let (app, state, _) = common::create_test_app();

    app.clone()
        .oneshot(post_json("/api/visits", json!({ "user_id": "alice" })))
        .await
        .unwrap();

    // Missing header
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/admin/streaks/alice/reset")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Wrong token
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/admin/streaks/alice/reset")
                .header(header::AUTHORIZATION, "Bearer wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = state.config.admin_token.clone().unwrap();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/admin/streaks/alice/reset")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["ok"], true);

    let response = app.oneshot(get("/api/streaks/alice")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_disabled_without_token() {
    use std::sync::Arc;
    use streakboard::config::Config;
    use streakboard::db::MemoryStore;
    use streakboard::AppState;

    let mut config = Config::test_default();
    config.admin_token = None;
    let state = Arc::new(AppState::new(config, Arc::new(MemoryStore::new())));
    let app = streakboard::routes::create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/admin/streaks/alice/reset")
                .header(header::AUTHORIZATION, "Bearer anything")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
