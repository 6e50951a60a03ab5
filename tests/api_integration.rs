//! Integration tests for the ProManage HTTP API
//!
//! These tests drive the full router in-process: registration, login,
//! bearer-token resolution and owner/admin access control over projects.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use promanage_backend::{create_router, AppState, Config};
use serde_json::{json, Value};
use std::collections::HashMap;
use tower::ServiceExt;

fn test_config() -> Config {
    let vars: HashMap<&str, &str> = [
        ("JWT_SECRET", "integration-test-secret"),
        ("BCRYPT_COST", "4"),
        ("SEED_DEMO_USERS", "true"),
    ]
    .into_iter()
    .collect();
    Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap()
}

fn test_app() -> Router {
    let config = test_config();
    let state = AppState::from_config(&config).unwrap();
    create_router(state, &config.cors_origins)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn register(app: &Router, username: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "name": username,
            "password": password,
        })),
    )
    .await
}

async fn login(app: &Router, username: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await
}

async fn token_for(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = login(app, username, password).await;
    assert_eq!(status, StatusCode::OK, "login failed for {}", username);
    body["access_token"].as_str().unwrap().to_string()
}

fn project_body(name: &str, budget: f64) -> Value {
    json!({
        "name": name,
        "description": "integration",
        "budget": budget,
        "start_date": "2025-01-15T00:00:00.000Z",
    })
}

fn tamper(token: &str) -> String {
    let idx = token.len() - 10;
    let mut chars: Vec<char> = token.chars().collect();
    chars[idx] = if chars[idx] == 'a' { 'b' } else { 'a' };
    chars.into_iter().collect()
}

#[tokio::test]
async fn register_login_and_resolve_identity() {
    let app = test_app();

    let (status, created) = register(&app, "alice", "pw1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["username"], "alice");
    assert_eq!(created["role"], "user");
    assert!(created.get("password").is_none());
    assert!(created.get("password_hash").is_none());

    let (status, session) = login(&app, "alice", "pw1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["token_type"], "bearer");
    assert_eq!(session["user"]["id"], created["id"]);
    assert_eq!(session["user"]["email"], "alice@example.com");
    let token = session["access_token"].as_str().unwrap();

    let (status, me) = send(&app, Method::GET, "/auth/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "alice");

    let (status, _) = send(&app, Method::GET, "/auth/me", Some(&tamper(token)), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_registration_rejected() {
    let app = test_app();

    let (status, first) = register(&app, "alice", "pw1").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = register(&app, "alice", "pw2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Username already exists");

    // The original account still logs in with its own password
    let (status, session) = login(&app, "alice", "pw1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["user"]["id"], first["id"]);
    let (status, _) = login(&app, "alice", "pw2").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = test_app();
    register(&app, "alice", "pw1").await;

    let (wrong_status, wrong_body) = login(&app, "alice", "nope").await;
    let (unknown_status, unknown_body) = login(&app, "ghost", "pw1").await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
}

#[tokio::test]
async fn protected_routes_require_bearer() {
    let app = test_app();

    for uri in ["/auth/me", "/projects", "/dashboard/stats"] {
        let (status, body) = send(&app, Method::GET, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} without token", uri);
        assert!(body["detail"].is_string());

        let (status, _) = send(&app, Method::GET, uri, Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} with garbage token", uri);
    }
}

#[tokio::test]
async fn token_from_another_deployment_rejected() {
    let app = test_app();
    register(&app, "alice", "pw1").await;

    let other_config = Config::from_lookup(|key| match key {
        "JWT_SECRET" => Some("some-other-secret".to_string()),
        "BCRYPT_COST" => Some("4".to_string()),
        "SEED_DEMO_USERS" => Some("false".to_string()),
        _ => None,
    })
    .unwrap();
    let other_app = create_router(
        AppState::from_config(&other_config).unwrap(),
        &other_config.cors_origins,
    );
    register(&other_app, "alice", "pw1").await;
    let foreign = token_for(&other_app, "alice", "pw1").await;

    let (status, _) = send(&app, Method::GET, "/auth/me", Some(&foreign), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn owner_and_admin_access_control() {
    let app = test_app();
    register(&app, "alice", "pw1").await;
    register(&app, "bob", "pw2").await;

    let alice = token_for(&app, "alice", "pw1").await;
    let bob = token_for(&app, "bob", "pw2").await;
    let admin = token_for(&app, "admin", "admin123").await;
    let manager = token_for(&app, "manager", "manager123").await;

    let (status, project) = send(
        &app,
        Method::POST,
        "/projects",
        Some(&alice),
        Some(project_body("Website", 5000.0)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(project["status"], "active");
    let uri = format!("/projects/{}", project["id"].as_str().unwrap());

    // Non-owner, non-admin
    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&bob),
        Some(json!({ "budget": 1.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Insufficient permissions");

    let (status, _) = send(&app, Method::GET, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Manager gets no special treatment
    let (status, _) = send(&app, Method::GET, &uri, Some(&manager), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Admin may edit anything
    let (status, updated) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&admin),
        Some(json!({ "budget": 7500.0, "status": "paused" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["budget"], 7500.0);
    assert_eq!(updated["status"], "paused");
    assert_eq!(updated["name"], "Website");
    assert_eq!(updated["created_by"], project["created_by"]);

    // Owner reads back the admin's change
    let (status, fetched) = send(&app, Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["budget"], 7500.0);

    // Listings are scoped
    let (_, bob_list) = send(&app, Method::GET, "/projects", Some(&bob), None).await;
    assert_eq!(bob_list.as_array().unwrap().len(), 0);
    let (_, admin_list) = send(&app, Method::GET, "/projects", Some(&admin), None).await;
    assert_eq!(admin_list.as_array().unwrap().len(), 1);

    // Owner deletes; the project is then gone
    let (status, body) = send(&app, Method::DELETE, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());
    let (status, _) = send(&app, Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_project_is_not_found() {
    let app = test_app();
    let admin = token_for(&app, "admin", "admin123").await;

    let (status, body) = send(
        &app,
        Method::GET,
        "/projects/00000000-0000-0000-0000-000000000000",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Project not found");

    let (status, _) = send(&app, Method::DELETE, "/projects/nope", Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dashboard_stats_follow_visibility() {
    let app = test_app();
    register(&app, "alice", "pw1").await;
    let alice = token_for(&app, "alice", "pw1").await;
    let user = token_for(&app, "user", "user123").await;
    let admin = token_for(&app, "admin", "admin123").await;

    send(&app, Method::POST, "/projects", Some(&alice), Some(project_body("A", 100.0))).await;
    send(&app, Method::POST, "/projects", Some(&alice), Some(project_body("B", 50.0))).await;
    send(&app, Method::POST, "/projects", Some(&user), Some(project_body("C", 25.0))).await;

    let (status, stats) = send(&app, Method::GET, "/dashboard/stats", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_projects"], 2);
    assert_eq!(stats["total_budget"], 150.0);
    assert_eq!(stats["status_count"]["active"], 2);
    assert_eq!(stats["recent_projects"].as_array().unwrap().len(), 2);

    let (_, stats) = send(&app, Method::GET, "/dashboard/stats", Some(&admin), None).await;
    assert_eq!(stats["total_projects"], 3);
    assert_eq!(stats["total_budget"], 175.0);
}

#[tokio::test]
async fn health_and_root_are_public() {
    let app = test_app();
    register(&app, "alice", "pw1").await;

    let (status, health) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ok");
    assert_eq!(health["users_count"], 4); // three demo users + alice
    assert_eq!(health["projects_count"], 0);

    let (status, root) = send(&app, Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(root["health"], "/health");
}
