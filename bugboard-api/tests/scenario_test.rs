/// End-to-end scenarios over HTTP against a real database
///
/// Every test truncates all tables first.
/// Run with: cargo test --test scenario_test -- --ignored --test-threads=1

mod common;

use axum::http::{header, Method, StatusCode};
use axum::Router;
use bugboard_shared::auth::jwt::validate_token;
use common::{db_app, send, TEST_SECRET};
use serde_json::{json, Value};

async fn register(app: &Router, name: &str) -> String {
    let res = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "name": name, "password": format!("{}-pw", name) })),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);

    res.body["userId"].as_str().unwrap().to_string()
}

async fn login(app: &Router, name: &str) -> String {
    let res = send(
        app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "name": name, "password": format!("{}-pw", name) })),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);

    res.body["token"].as_str().unwrap().to_string()
}

/// Registers and logs in, returning `(user_id, token)`
async fn sign_up(app: &Router, name: &str) -> (String, String) {
    let id = register(app, name).await;
    let token = login(app, name).await;
    (id, token)
}

async fn create_task(app: &Router, token: &str, title: &str, participants: &[&str]) -> String {
    let res = send(
        app,
        Method::POST,
        "/api/task",
        Some(token),
        Some(json!({ "title": title, "participantIds": participants })),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.body);

    res.body["data"]["id"].as_str().unwrap().to_string()
}

fn titles(list: &Value) -> Vec<&str> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|task| task["title"].as_str().unwrap())
        .collect()
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database (DATABASE_URL)"]
async fn test_registration_and_login() {
    let (app, _pool) = db_app().await;

    let alice_id = register(&app, "alice").await;
    let bob_id = register(&app, "bob").await;

    let res = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "name": "alice", "password": "other" })),
    )
    .await;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let res = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "name": "alice", "password": "alice-pw" })),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    let cookie = res.headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));

    let token = res.body["token"].as_str().unwrap();
    let claims = validate_token(token, TEST_SECRET).unwrap();
    assert_eq!(claims.sub.to_string(), alice_id);
    assert_eq!(claims.name, "alice");

    let res = send(&app, Method::GET, "/api/me", Some(token), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["role"], "admin");
    assert!(res.body.get("passwordHash").is_none());

    let bob_token = login(&app, "bob").await;
    let res = send(&app, Method::GET, "/api/me", Some(&bob_token), None).await;
    assert_eq!(res.body["id"], bob_id.as_str());
    assert_eq!(res.body["role"], "user");

    // Wrong password and unknown name are indistinguishable
    let wrong_password = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "name": "alice", "password": "nope" })),
    )
    .await;
    let unknown_name = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "name": "mallory", "password": "nope" })),
    )
    .await;
    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_name.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown_name.body);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database (DATABASE_URL)"]
async fn test_user_directory() {
    let (app, _pool) = db_app().await;

    let (_, admin_token) = sign_up(&app, "admin").await;
    let (bob_id, bob_token) = sign_up(&app, "bob").await;
    let (carol_id, _) = sign_up(&app, "carol").await;

    let res = send(&app, Method::GET, "/api/users", Some(&bob_token), None).await;
    let users = res.body["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["id"], carol_id.as_str());

    let res = send(&app, Method::GET, "/api/users", Some(&admin_token), None).await;
    let names: Vec<&str> = res.body["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["carol", "bob"]);
    assert!(res.body["users"][1].get("passwordHash").is_none());
    assert_eq!(res.body["users"][1]["id"], bob_id.as_str());
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database (DATABASE_URL)"]
async fn test_participants_read_but_cannot_write() {
    let (app, _pool) = db_app().await;

    let (_, alice) = sign_up(&app, "alice").await;
    let (bob_id, bob) = sign_up(&app, "bob").await;
    let (_, carol) = sign_up(&app, "carol").await;

    // Own id, duplicates and garbage are dropped from the participant list
    let alice_id = validate_token(&alice, TEST_SECRET).unwrap().sub.to_string();
    let res = send(
        &app,
        Method::POST,
        "/api/task",
        Some(&alice),
        Some(json!({
            "title": "T1",
            "participantIds": [bob_id, bob_id, alice_id, "not-a-uuid"],
        })),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED);
    let participants = res.body["data"]["participants"].as_array().unwrap();
    assert_eq!(participants.len(), 1);
    assert_eq!(participants[0]["id"], bob_id.as_str());
    let task_id = res.body["data"]["id"].as_str().unwrap().to_string();
    let task_uri = format!("/api/task/{}", task_id);

    let res = send(&app, Method::GET, "/api/task", Some(&bob), None).await;
    assert_eq!(titles(&res.body["participatingTasks"]), vec!["T1"]);
    assert!(titles(&res.body["ownedTasks"]).is_empty());

    let res = send(&app, Method::GET, &task_uri, Some(&bob), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["task"]["owner"]["name"], "alice");

    // Outsiders see nothing, exactly like a missing task
    let outsider = send(&app, Method::GET, &task_uri, Some(&carol), None).await;
    let missing = send(
        &app,
        Method::GET,
        &format!("/api/task/{}", uuid::Uuid::new_v4()),
        Some(&carol),
        None,
    )
    .await;
    assert_eq!(outsider.status, StatusCode::NOT_FOUND);
    assert_eq!(outsider.body, missing.body);

    let res = send(
        &app,
        Method::PUT,
        &task_uri,
        Some(&bob),
        Some(json!({ "done": true })),
    )
    .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = send(&app, Method::DELETE, &task_uri, Some(&bob), None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = send(
        &app,
        Method::POST,
        "/api/bug",
        Some(&bob),
        Some(json!({ "title": "B1", "taskId": task_id })),
    )
    .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = send(
        &app,
        Method::PUT,
        &task_uri,
        Some(&alice),
        Some(json!({ "done": true })),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["done"], true);

    let res = send(&app, Method::GET, "/api/task?status=completed", Some(&bob), None).await;
    assert_eq!(titles(&res.body["participatingTasks"]), vec!["T1"]);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database (DATABASE_URL)"]
async fn test_hiding_is_per_user() {
    let (app, _pool) = db_app().await;

    let (_, alice) = sign_up(&app, "alice").await;
    let (bob_id, bob) = sign_up(&app, "bob").await;
    let (_, carol) = sign_up(&app, "carol").await;

    let t1 = create_task(&app, &alice, "T1", &[&bob_id]).await;
    create_task(&app, &alice, "T2", &[]).await;
    let hide_uri = format!("/api/task/{}/hide", t1);

    let res = send(&app, Method::POST, &hide_uri, Some(&bob), None).await;
    assert_eq!(res.status, StatusCode::OK);

    let res = send(&app, Method::POST, &hide_uri, Some(&bob), None).await;
    assert_eq!(res.status, StatusCode::CONFLICT);

    // Not visible to carol, so not hideable either
    let res = send(&app, Method::POST, &hide_uri, Some(&carol), None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = send(&app, Method::GET, "/api/task", Some(&bob), None).await;
    assert!(titles(&res.body["participatingTasks"]).is_empty());

    let res = send(&app, Method::GET, "/api/task?status=hidden", Some(&bob), None).await;
    assert_eq!(titles(&res.body["hiddenTasks"]), vec!["T1"]);
    assert!(titles(&res.body["ownedTasks"]).is_empty());

    // The owner's view is unaffected
    let res = send(&app, Method::GET, "/api/task", Some(&alice), None).await;
    assert_eq!(titles(&res.body["ownedTasks"]), vec!["T2", "T1"]);

    let res = send(&app, Method::DELETE, &hide_uri, Some(&bob), None).await;
    assert_eq!(res.status, StatusCode::OK);

    let res = send(&app, Method::DELETE, &hide_uri, Some(&bob), None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = send(&app, Method::GET, "/api/task", Some(&bob), None).await;
    assert_eq!(titles(&res.body["participatingTasks"]), vec!["T1"]);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database (DATABASE_URL)"]
async fn test_bug_lifecycle() {
    let (app, _pool) = db_app().await;

    let (_, alice) = sign_up(&app, "alice").await;
    let (bob_id, bob) = sign_up(&app, "bob").await;
    let (_, carol) = sign_up(&app, "carol").await;

    let task_id = create_task(&app, &alice, "T1", &[&bob_id]).await;

    let res = send(
        &app,
        Method::POST,
        "/api/bug",
        Some(&alice),
        Some(json!({ "title": "Login crash", "taskId": task_id })),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["data"]["status"], "in_progress");
    let bug_uri = format!("/api/bug/{}", res.body["data"]["id"].as_str().unwrap());

    send(
        &app,
        Method::POST,
        "/api/bug",
        Some(&alice),
        Some(json!({ "title": "Typo on dashboard", "taskId": task_id })),
    )
    .await;

    let res = send(
        &app,
        Method::PUT,
        &bug_uri,
        Some(&alice),
        Some(json!({ "status": "fixed" })),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["data"]["status"], "fixed");
    assert_eq!(res.body["data"]["title"], "Login crash");

    // Participants read bugs but cannot change them
    let res = send(&app, Method::GET, &bug_uri, Some(&bob), None).await;
    assert_eq!(res.status, StatusCode::OK);
    let res = send(
        &app,
        Method::PUT,
        &bug_uri,
        Some(&bob),
        Some(json!({ "status": "testing" })),
    )
    .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    let res = send(&app, Method::GET, &bug_uri, Some(&carol), None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let bugs_uri = format!("/api/task/{}/bugs", task_id);
    let res = send(&app, Method::GET, &bugs_uri, Some(&bob), None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["task"]["title"], "T1");
    assert_eq!(res.body["bugs"].as_array().unwrap().len(), 2);

    let res = send(
        &app,
        Method::GET,
        &format!("{}?status=fixed", bugs_uri),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(titles(&res.body["bugs"]), vec!["Login crash"]);

    let res = send(
        &app,
        Method::GET,
        &format!("{}?q=DASH", bugs_uri),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(titles(&res.body["bugs"]), vec!["Typo on dashboard"]);

    let res = send(&app, Method::DELETE, &bug_uri, Some(&alice), None).await;
    assert_eq!(res.status, StatusCode::OK);
    let res = send(&app, Method::GET, &bug_uri, Some(&alice), None).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL database (DATABASE_URL)"]
async fn test_task_delete_cascades() {
    let (app, pool) = db_app().await;

    let (_, alice) = sign_up(&app, "alice").await;
    let (bob_id, bob) = sign_up(&app, "bob").await;

    let task_id = create_task(&app, &alice, "T1", &[&bob_id]).await;
    send(
        &app,
        Method::POST,
        "/api/bug",
        Some(&alice),
        Some(json!({ "title": "B1", "taskId": task_id })),
    )
    .await;
    send(
        &app,
        Method::POST,
        &format!("/api/task/{}/hide", task_id),
        Some(&bob),
        None,
    )
    .await;

    let res = send(
        &app,
        Method::DELETE,
        &format!("/api/task/{}", task_id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);

    for table in ["tasks", "bugs", "task_participants", "hidden_tasks"] {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0, "{} not empty", table);
    }

    let res = send(&app, Method::GET, "/api/me", Some(&bob), None).await;
    assert_eq!(res.body["tasksParticipating"], 0);
}
