//! End-to-end authentication flow over the router with in-memory
//! collaborators standing in for Postgres and Redis.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use tower::ServiceExt;

use gatehouse_api::{auth::MemorySessionStore, routes::create_router, AppState, Config};
use gatehouse_shared::MemoryDirectory;

fn test_router() -> Router {
    let config = Config {
        bind_address: "127.0.0.1:0".to_string(),
        database_url: String::new(),
        redis_url: String::new(),
        session_ttl_seconds: 3600,
    };
    let state = AppState::new(
        config,
        Arc::new(MemoryDirectory::new()),
        Arc::new(MemorySessionStore::new()),
    );
    create_router(state)
}

fn post(path: &str, body: serde_json::Value, cookie: Option<&str>) -> Request<Body> {
    request("POST", path, Some(body), cookie)
}

fn request(
    method: &str,
    path: &str,
    body: Option<serde_json::Value>,
    cookie: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, format!("gh_session={cookie}"));
    }
    let body = match body {
        Some(json) => Body::from(json.to_string()),
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

async fn body_string(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Pull the session token out of the Set-Cookie response header.
fn session_token(response: &Response) -> Option<String> {
    let raw = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    let (name, rest) = raw.split_once('=')?;
    assert_eq!(name, "gh_session");
    Some(rest.split(';').next()?.to_string())
}

#[tokio::test]
async fn sign_up_succeeds_once_then_duplicate_email_is_rejected() {
    let app = test_router();
    let body = serde_json::json!({"username": "a", "password": "p", "email": "a@x.com"});

    let response = app
        .clone()
        .oneshot(post("/auths/sign-up", body.clone(), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(session_token(&response).is_some());
    assert_eq!(body_string(response).await, "OK");

    // Same email, different username: still a duplicate, nothing created.
    let again = serde_json::json!({"username": "b", "password": "p", "email": "a@x.com"});
    let response = app
        .clone()
        .oneshot(post("/auths/sign-up", again, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_string(response).await, "duplicated_email_error");

    // The rejected sign-up left no record behind.
    let sign_in = serde_json::json!({"username": "b", "password": "p"});
    let response = app
        .oneshot(post("/auths/sign-in", sign_in, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sign_up_with_missing_field_mutates_nothing() {
    let app = test_router();

    let body = serde_json::json!({"username": "a", "email": "a@x.com"});
    let response = app
        .clone()
        .oneshot(post("/auths/sign-up", body, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_string(response).await, "non_field_errors");

    // The email was not claimed by the failed attempt.
    let retry = serde_json::json!({"username": "a", "password": "p", "email": "a@x.com"});
    let response = app
        .oneshot(post("/auths/sign-up", retry, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_identifier_and_wrong_password_are_indistinguishable() {
    let app = test_router();
    let body = serde_json::json!({"username": "a", "password": "p", "email": "a@x.com"});
    app.clone()
        .oneshot(post("/auths/sign-up", body, None))
        .await
        .unwrap();

    let wrong_password = serde_json::json!({"username": "a", "password": "nope"});
    let wrong = app
        .clone()
        .oneshot(post("/auths/sign-in", wrong_password, None))
        .await
        .unwrap();

    let unknown_user = serde_json::json!({"username": "nobody", "password": "p"});
    let unknown = app
        .oneshot(post("/auths/sign-in", unknown_user, None))
        .await
        .unwrap();

    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_string(wrong).await, body_string(unknown).await);
}

#[tokio::test]
async fn sign_in_returns_public_user_without_hash() {
    let app = test_router();
    let body = serde_json::json!({"username": "a", "password": "p", "email": "a@x.com"});
    app.clone()
        .oneshot(post("/auths/sign-up", body, None))
        .await
        .unwrap();

    let sign_in = serde_json::json!({"username": "a", "password": "p"});
    let response = app
        .oneshot(post("/auths/sign-in", sign_in, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(session_token(&response).is_some());

    let body = body_string(response).await;
    let user: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(user["username"], "a");
    assert_eq!(user["email"], "a@x.com");
    assert!(user.get("password_hash").is_none());
    assert!(!body.contains("argon2"));
}

#[tokio::test]
async fn password_change_flips_which_password_signs_in() {
    let app = test_router();
    let body = serde_json::json!({"username": "a", "password": "old", "email": "a@x.com"});
    let response = app
        .clone()
        .oneshot(post("/auths/sign-up", body, None))
        .await
        .unwrap();
    // Sign-up established a usable session.
    let token = session_token(&response).unwrap();

    let change = serde_json::json!({"password": "new"});
    let response = app
        .clone()
        .oneshot(post("/auths/modify-password", change, Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "OK");

    let old = serde_json::json!({"username": "a", "password": "old"});
    let response = app
        .clone()
        .oneshot(post("/auths/sign-in", old, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let new = serde_json::json!({"username": "a", "password": "new"});
    let response = app
        .oneshot(post("/auths/sign-in", new, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn modify_password_requires_a_session_and_a_password() {
    let app = test_router();

    let change = serde_json::json!({"password": "new"});
    let response = app
        .clone()
        .oneshot(post("/auths/modify-password", change, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_string(response).await, "not_auth_error");

    // Authenticated but missing the field.
    let body = serde_json::json!({"username": "a", "password": "p", "email": "a@x.com"});
    let response = app
        .clone()
        .oneshot(post("/auths/sign-up", body, None))
        .await
        .unwrap();
    let token = session_token(&response).unwrap();

    let response = app
        .oneshot(post(
            "/auths/modify-password",
            serde_json::json!({}),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_string(response).await, "non_field_errors");
}

#[tokio::test]
async fn sign_out_destroys_the_session_for_good() {
    let app = test_router();
    let body = serde_json::json!({"username": "a", "password": "p", "email": "a@x.com"});
    let response = app
        .clone()
        .oneshot(post("/auths/sign-up", body, None))
        .await
        .unwrap();
    let token = session_token(&response).unwrap();

    let response = app
        .clone()
        .oneshot(request("DELETE", "/auths/sign-out", None, Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "OK");

    // The old token never rehydrates.
    let change = serde_json::json!({"password": "new"});
    let response = app
        .clone()
        .oneshot(post("/auths/modify-password", change, Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_string(response).await, "not_auth_error");

    // And signing out again without a session is rejected.
    let response = app
        .oneshot(request("DELETE", "/auths/sign-out", None, Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_string(response).await, "not_auth_error");
}
