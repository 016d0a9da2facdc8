// tests/auth_guard_tests.rs

mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use common::{HOST_ID, QUIZ_ID, SECRET};
use livequiz::utils::jwt::sign_jwt;
use tower::ServiceExt;

async fn app() -> axum::Router {
    common::test_app().await.0
}

fn create_session_request(auth: Option<String>) -> Request<Body> {
    let mut req = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/live/quizzes/{}/sessions", QUIZ_ID))
        .header("content-type", "application/json");
    if let Some(auth) = auth {
        req = req.header("authorization", auth);
    }
    req.body(Body::from("{}")).expect("request build should succeed")
}

#[tokio::test]
async fn session_creation_rejects_missing_or_bad_tokens() {
    let app = app().await;

    let other_secret = sign_jwt(HOST_ID, "some_other_secret", 600).unwrap();
    let cases = [
        None,
        Some("Token abc".to_string()),
        Some("Bearer not-a-jwt".to_string()),
        Some(format!("Bearer {}", other_secret)),
    ];

    for auth in cases {
        let resp = app
            .clone()
            .oneshot(create_session_request(auth.clone()))
            .await
            .expect("router should respond");

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "expected UNAUTHORIZED for {auth:?}");
    }
}

#[tokio::test]
async fn session_creation_accepts_a_valid_login() {
    let app = app().await;
    let token = sign_jwt(HOST_ID, SECRET, 600).unwrap();

    let resp = app
        .oneshot(create_session_request(Some(format!("Bearer {}", token))))
        .await
        .expect("router should respond");

    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn live_socket_route_needs_an_upgrade() {
    let app = app().await;

    let req = Request::builder()
        .method(Method::GET)
        .uri("/ws/live/123456")
        .body(Body::empty())
        .expect("request build should succeed");
    let resp = app.oneshot(req).await.expect("router should respond");

    assert!(resp.status().is_client_error());
    assert_ne!(resp.status(), StatusCode::NOT_FOUND);
}
