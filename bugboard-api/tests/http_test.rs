/// HTTP tests that run without a database
///
/// The router is built on a pool that never connects, so every request here
/// must be answered by authentication, routing or input validation before
/// any query would run.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use bugboard_shared::auth::jwt::{create_token, Claims};
use chrono::Duration;
use common::{lazy_app, lazy_app_with, send, send_request, token_for, TEST_SECRET};
use serde_json::json;
use uuid::Uuid;

fn alice_token() -> String {
    token_for(Uuid::new_v4(), "alice")
}

#[tokio::test]
async fn test_health_reports_degraded_without_database() {
    let app = lazy_app();

    let res = send(&app, Method::GET, "/health", None, None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["status"], "degraded");
    assert_eq!(res.body["database"], "disconnected");
    assert_eq!(res.headers.get("x-content-type-options").unwrap(), "nosniff");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = lazy_app();

    for (method, uri) in [
        (Method::GET, "/api/me"),
        (Method::GET, "/api/users"),
        (Method::GET, "/api/task"),
        (Method::POST, "/api/task"),
        (Method::GET, "/api/bug/00000000-0000-0000-0000-000000000000"),
    ] {
        let res = send(&app, method, uri, None, None).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(res.body["error"], "unauthorized");
    }
}

#[tokio::test]
async fn test_invalid_tokens_are_forbidden() {
    let app = lazy_app();
    let user_id = Uuid::new_v4();

    let expired = create_token(
        &Claims::with_expiration(user_id, "alice", Duration::seconds(-60)),
        TEST_SECRET,
    )
    .unwrap();
    let wrong_secret = create_token(
        &Claims::new(user_id, "alice"),
        "another-secret-key-that-is-32-bytes-long",
    )
    .unwrap();

    for token in ["garbage", expired.as_str(), wrong_secret.as_str()] {
        let res = send(&app, Method::GET, "/api/task", Some(token), None).await;
        assert_eq!(res.status, StatusCode::FORBIDDEN);
        assert_eq!(res.body["error"], "forbidden");
    }
}

#[tokio::test]
async fn test_token_accepted_from_cookie() {
    let app = lazy_app();

    let request = Request::builder()
        .uri("/api/task?status=archived")
        .header(header::COOKIE, format!("theme=dark; token={}", alice_token()))
        .body(Body::empty())
        .unwrap();
    let res = send_request(&app, request).await;

    // Past authentication, rejected by query validation
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cookie_takes_precedence_over_header() {
    let app = lazy_app();

    let request = Request::builder()
        .uri("/api/task?status=archived")
        .header(header::COOKIE, format!("token={}", alice_token()))
        .header(header::AUTHORIZATION, "Bearer garbage")
        .body(Body::empty())
        .unwrap();
    assert_eq!(send_request(&app, request).await.status, StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .uri("/api/task?status=archived")
        .header(header::COOKIE, "token=garbage")
        .header(header::AUTHORIZATION, format!("Bearer {}", alice_token()))
        .body(Body::empty())
        .unwrap();
    assert_eq!(send_request(&app, request).await.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_status_filters_rejected() {
    let app = lazy_app();
    let token = alice_token();

    let res = send(&app, Method::GET, "/api/task?status=archived", Some(&token), None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "validation_error");
    assert_eq!(res.body["details"][0]["field"], "status");

    let uri = format!("/api/task/{}/bugs?status=closed", Uuid::new_v4());
    let res = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_query_string_is_json_error() {
    let app = lazy_app();
    let token = alice_token();

    let uri = format!("/api/task/{}/bugs?status=fixed&status=testing", Uuid::new_v4());
    let res = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "bad_request");
    assert!(res.body["message"].as_str().unwrap().contains("status"));

    let res = send(
        &app,
        Method::GET,
        "/api/task?status=active&status=hidden",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "bad_request");
}

#[tokio::test]
async fn test_create_task_requires_title() {
    let app = lazy_app();
    let token = alice_token();

    for body in [json!({}), json!({ "title": "   " }), json!({ "title": "" })] {
        let res = send(&app, Method::POST, "/api/task", Some(&token), Some(body)).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST);
        assert_eq!(res.body["details"][0]["field"], "title");
    }
}

#[tokio::test]
async fn test_update_task_rejects_blank_title() {
    let app = lazy_app();
    let uri = format!("/api/task/{}", Uuid::new_v4());

    let res = send(
        &app,
        Method::PUT,
        &uri,
        Some(&alice_token()),
        Some(json!({ "title": " " })),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_bug_validation() {
    let app = lazy_app();
    let token = alice_token();

    let res = send(
        &app,
        Method::POST,
        "/api/bug",
        Some(&token),
        Some(json!({ "title": "B1" })),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["details"][0]["field"], "taskId");

    let res = send(
        &app,
        Method::POST,
        "/api/bug",
        Some(&token),
        Some(json!({ "taskId": Uuid::new_v4() })),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["details"][0]["field"], "title");
}

#[tokio::test]
async fn test_update_bug_rejects_unknown_status() {
    let app = lazy_app();
    let uri = format!("/api/bug/{}", Uuid::new_v4());

    let res = send(
        &app,
        Method::PUT,
        &uri,
        Some(&alice_token()),
        Some(json!({ "status": "closed" })),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["details"][0]["field"], "status");
}

#[tokio::test]
async fn test_unparsable_ids_are_not_found() {
    let app = lazy_app();
    let token = alice_token();

    for (method, uri) in [
        (Method::GET, "/api/task/not-a-uuid"),
        (Method::DELETE, "/api/task/not-a-uuid"),
        (Method::POST, "/api/task/not-a-uuid/hide"),
        (Method::GET, "/api/bug/42"),
    ] {
        let res = send(&app, method, uri, Some(&token), None).await;
        assert_eq!(res.status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(res.body["error"], "not_found");
    }
}

#[tokio::test]
async fn test_register_and_login_validation() {
    let app = lazy_app();

    let cases = [
        ("/api/auth/register", json!({ "name": "alice" })),
        ("/api/auth/register", json!({ "password": "pw" })),
        ("/api/auth/register", json!({ "name": "  ", "password": "pw" })),
        (
            "/api/auth/register",
            json!({ "name": "alice", "password": "pw", "email": "nope" }),
        ),
        ("/api/auth/login", json!({ "name": "alice" })),
        ("/api/auth/login", json!({ "password": "pw" })),
    ];

    for (uri, body) in cases {
        let res = send(&app, Method::POST, uri, None, Some(body.clone())).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{} {}", uri, body);
        assert_eq!(res.body["error"], "validation_error");
    }
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = lazy_app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let res = send_request(&app, request).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["error"], "bad_request");
}

#[tokio::test]
async fn test_custom_prefix() {
    let app = lazy_app_with(&[("API_PREFIX", "/v1")]);

    let res = send(&app, Method::GET, "/v1/task", None, None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = send(&app, Method::GET, "/api/task", None, None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_preflight_for_configured_origin() {
    let app = lazy_app();

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/task")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let res = send_request(&app, request).await;

    assert_eq!(
        res.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:5173"
    );
    assert_eq!(
        res.headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
        "true"
    );
}

#[tokio::test]
async fn test_cors_ignores_other_origins() {
    let app = lazy_app();

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/task")
        .header(header::ORIGIN, "https://evil.example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap();
    let res = send_request(&app, request).await;

    assert!(res.headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}
