//! API integration tests

use axum::body::Body;
use axum::Router;
use hyper::{Request, StatusCode};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use mindhaven::models::Role;
use mindhaven::{auth, routes, AppState};

const TEST_SECRET: &str = "test-secret";

async fn setup_app() -> (Router, Arc<AppState>) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    // Run migrations manually
    for ddl in [
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS admins (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS therapists (
            id TEXT PRIMARY KEY NOT NULL,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            approved INTEGER NOT NULL DEFAULT 0,
            profile TEXT NOT NULL DEFAULT '{}',
            update_requests TEXT NOT NULL DEFAULT '[]',
            pending_count INTEGER NOT NULL DEFAULT 0,
            version INTEGER NOT NULL DEFAULT 0,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS content_items (
            id TEXT PRIMARY KEY NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('blog', 'guide', 'event')),
            title TEXT NOT NULL,
            body TEXT NOT NULL DEFAULT '',
            meta TEXT NOT NULL DEFAULT '{}',
            author_id TEXT NOT NULL,
            author_name TEXT NOT NULL,
            approved INTEGER NOT NULL DEFAULT 0,
            approved_by_id TEXT,
            approved_by_name TEXT,
            approved_at DATETIME,
            created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    ] {
        sqlx::query(ddl)
            .execute(&pool)
            .await
            .expect("Failed to create table");
    }

    let state = AppState::new(pool, TEST_SECRET);
    (routes::router(state.clone()), state)
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
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
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    };
    (status, value)
}

/// Register a therapist through the API; returns (id, token)
async fn signup_therapist(app: &Router, email: &str) -> (Uuid, String) {
    let (status, body) = call(
        app,
        "POST",
        "/api/auth/signup/therapist",
        None,
        Some(json!({ "name": "Dr. X", "email": email, "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {}", body);

    let id = Uuid::parse_str(body["therapist"]["id"].as_str().unwrap()).unwrap();
    let token = body["token"].as_str().unwrap().to_string();
    (id, token)
}

fn admin_token() -> String {
    auth::create_token(Uuid::new_v4(), Role::Admin, "Admin", TEST_SECRET).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _state) = setup_app().await;
    let (status, _) = call(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_user_signup_and_login() {
    let (app, _state) = setup_app().await;

    let (status, body) = call(
        &app,
        "POST",
        "/api/auth/signup/user",
        None,
        Some(json!({ "name": "Alice", "email": "alice@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["token"].is_string());
    // Password never leaks
    assert!(body["user"].get("passwordHash").is_none());

    // Duplicate signup
    let (status, _) = call(
        &app,
        "POST",
        "/api/auth/signup/user",
        None,
        Some(json!({ "name": "Alice", "email": "alice@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Login
    let (status, body) = call(
        &app,
        "POST",
        "/api/auth/login/user",
        None,
        Some(json!({ "email": "alice@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], json!("user"));

    // Wrong password
    let (status, _) = call(
        &app,
        "POST",
        "/api/auth/login/user",
        None,
        Some(json!({ "email": "alice@example.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown account
    let (status, _) = call(
        &app,
        "POST",
        "/api/auth/login/user",
        None,
        Some(json!({ "email": "nobody@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_signup_validation() {
    let (app, _state) = setup_app().await;

    let (status, _) = call(
        &app,
        "POST",
        "/api/auth/signup/user",
        None,
        Some(json!({ "name": "Alice", "email": "not-an-email", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        "POST",
        "/api/auth/signup/user",
        None,
        Some(json!({ "name": "Alice", "email": "alice@example.com", "password": "short" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_login() {
    let (app, state) = setup_app().await;

    let hash = auth::hash_password("admin-password").unwrap();
    state
        .store
        .create_admin("Admin", "admin@example.com", &hash)
        .await
        .unwrap();

    let (status, body) = call(
        &app,
        "POST",
        "/api/admin/login",
        None,
        Some(json!({ "email": "admin@example.com", "password": "admin-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], json!("admin"));
}

#[tokio::test]
async fn test_me_requires_token() {
    let (app, _state) = setup_app().await;

    let (status, _) = call(&app, "GET", "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, "GET", "/api/auth/me", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_id, token) = signup_therapist(&app, "drx@example.com").await;
    let (status, body) = call(&app, "GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], json!("therapist"));
    assert_eq!(body["name"], json!("Dr. X"));
}

#[tokio::test]
async fn test_profile_update_direct_fields() {
    let (app, _state) = setup_app().await;
    let (id, token) = signup_therapist(&app, "drx@example.com").await;

    let (status, body) = call(
        &app,
        "PUT",
        "/api/therapist/profile",
        Some(&token),
        Some(json!({ "city": "Vienna", "description": "CBT practice" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Profile updated successfully"));
    assert!(body.get("pendingRequests").is_none());

    let (_, body) = call(&app, "GET", &format!("/api/therapists/{}", id), None, None).await;
    assert_eq!(body["therapist"]["city"], json!("Vienna"));
}

#[tokio::test]
async fn test_profile_update_governed_field_queued() {
    let (app, _state) = setup_app().await;
    let (id, token) = signup_therapist(&app, "drx@example.com").await;

    let (status, body) = call(
        &app,
        "PUT",
        "/api/therapist/profile",
        Some(&token),
        Some(json!({ "phone": "555-0100" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        json!("Profile update requests submitted. Waiting for admin approval.")
    );
    assert_eq!(body["pendingRequests"].as_array().unwrap().len(), 1);
    assert_eq!(body["pendingRequests"][0]["field"], json!("phone"));

    // Live profile untouched, pending request visible on fetch
    let (_, body) = call(&app, "GET", &format!("/api/therapists/{}", id), None, None).await;
    assert_eq!(body["therapist"]["phone"], json!(""));
    assert_eq!(
        body["therapist"]["updateRequests"].as_array().unwrap().len(),
        1
    );
}

#[tokio::test]
async fn test_profile_update_no_valid_changes() {
    let (app, _state) = setup_app().await;
    let (_id, token) = signup_therapist(&app, "drx@example.com").await;

    let (status, body) = call(
        &app,
        "PUT",
        "/api/therapist/profile",
        Some(&token),
        Some(json!({ "email": "other@example.com", "phone": null })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("No valid changes"));
}

#[tokio::test]
async fn test_profile_update_requires_therapist_role() {
    let (app, _state) = setup_app().await;

    let (status, _) = call(
        &app,
        "PUT",
        "/api/therapist/profile",
        None,
        Some(json!({ "city": "Vienna" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let user_token =
        auth::create_token(Uuid::new_v4(), Role::User, "Alice", TEST_SECRET).unwrap();
    let (status, _) = call(
        &app,
        "PUT",
        "/api/therapist/profile",
        Some(&user_token),
        Some(json!({ "city": "Vienna" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_resolve_request_applies_and_guards_double_approval() {
    let (app, _state) = setup_app().await;
    let (id, token) = signup_therapist(&app, "drx@example.com").await;
    let admin = admin_token();

    let (_, body) = call(
        &app,
        "PUT",
        "/api/therapist/profile",
        Some(&token),
        Some(json!({ "phone": "555-0100" })),
    )
    .await;
    let request_id = body["pendingRequests"][0]["id"].as_str().unwrap().to_string();

    let uri = format!("/api/admin/therapists/{}/requests/{}/approve", id, request_id);
    let (status, body) = call(&app, "PUT", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK, "approve failed: {}", body);
    assert_eq!(body["request"]["status"], json!("approved"));

    let (_, body) = call(&app, "GET", &format!("/api/therapists/{}", id), None, None).await;
    assert_eq!(body["therapist"]["phone"], json!("555-0100"));

    // Second approval of the same request
    let (status, _) = call(&app, "PUT", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown request id
    let uri = format!(
        "/api/admin/therapists/{}/requests/{}/approve",
        id,
        Uuid::new_v4()
    );
    let (status, _) = call(&app, "PUT", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reject_request_leaves_profile_untouched() {
    let (app, _state) = setup_app().await;
    let (id, token) = signup_therapist(&app, "drx@example.com").await;
    let admin = admin_token();

    let (_, body) = call(
        &app,
        "PUT",
        "/api/therapist/profile",
        Some(&token),
        Some(json!({ "phone": "555-0100" })),
    )
    .await;
    let request_id = body["pendingRequests"][0]["id"].as_str().unwrap();

    let uri = format!("/api/admin/therapists/{}/requests/{}/reject", id, request_id);
    let (status, body) = call(&app, "PUT", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["request"]["status"], json!("rejected"));

    let (_, body) = call(&app, "GET", &format!("/api/therapists/{}", id), None, None).await;
    assert_eq!(body["therapist"]["phone"], json!(""));
}

#[tokio::test]
async fn test_account_approval_resolves_all_pending() {
    let (app, _state) = setup_app().await;
    let (id, token) = signup_therapist(&app, "drx@example.com").await;
    let admin = admin_token();

    call(
        &app,
        "PUT",
        "/api/therapist/profile",
        Some(&token),
        Some(json!({
            "phone": "555-0100",
            "onlineDetails": { "platform": "Zoom" }
        })),
    )
    .await;

    let uri = format!("/api/admin/therapists/{}/approve", id);
    let (status, body) = call(&app, "PUT", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["therapist"]["approved"], json!(true));
    assert_eq!(body["therapist"]["phone"], json!("555-0100"));
    assert_eq!(body["therapist"]["onlineDetails"]["platform"], json!("Zoom"));

    // Now listed as approved, no longer pending
    let (_, body) = call(&app, "GET", "/api/therapists/approved", None, None).await;
    assert_eq!(body["count"], json!(1));

    let (_, body) = call(
        &app,
        "GET",
        "/api/admin/therapists/pending",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(body["therapists"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_reject_account_deletes_record() {
    let (app, _state) = setup_app().await;
    let (id, _token) = signup_therapist(&app, "drx@example.com").await;
    let admin = admin_token();

    let uri = format!("/api/admin/therapists/{}", id);
    let (status, _) = call(&app, "DELETE", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&app, "GET", &format!("/api/therapists/{}", id), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_routes_reject_other_roles() {
    let (app, _state) = setup_app().await;
    let (id, therapist_token) = signup_therapist(&app, "drx@example.com").await;

    let uri = format!("/api/admin/therapists/{}/approve", id);
    let (status, _) = call(&app, "PUT", &uri, Some(&therapist_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, "GET", "/api/admin/therapists/pending", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_content_moderation_flow() {
    let (app, _state) = setup_app().await;
    let (_id, token) = signup_therapist(&app, "drx@example.com").await;
    let admin = admin_token();

    let (status, body) = call(
        &app,
        "POST",
        "/api/content/blog",
        Some(&token),
        Some(json!({ "title": "On burnout", "body": "..." })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["item"]["approved"], json!(false));
    let item_id = body["item"]["id"].as_str().unwrap().to_string();

    // Invisible publicly until approved
    let (_, body) = call(&app, "GET", "/api/content/blog", None, None).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 0);
    assert_eq!(body["pagination"]["total"], json!(0));

    // Visible to the author and to admins
    let (_, body) = call(&app, "GET", "/api/content/blog/mine", Some(&token), None).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    let (_, body) = call(
        &app,
        "GET",
        "/api/content/blog/unapproved",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    // Approve and recheck
    let uri = format!("/api/content/blog/{}/approve", item_id);
    let (status, body) = call(&app, "PUT", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item"]["approvedByName"], json!("Admin"));

    let (_, body) = call(&app, "GET", "/api/content/blog", None, None).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_content_role_guards() {
    let (app, _state) = setup_app().await;
    let (_id, therapist_token) = signup_therapist(&app, "drx@example.com").await;

    // Only admins list unapproved content
    let (status, _) = call(
        &app,
        "GET",
        "/api/content/blog/unapproved",
        Some(&therapist_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Only therapists create content
    let user_token =
        auth::create_token(Uuid::new_v4(), Role::User, "Alice", TEST_SECRET).unwrap();
    let (status, _) = call(
        &app,
        "POST",
        "/api/content/blog",
        Some(&user_token),
        Some(json!({ "title": "Hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_content_listing_with_extreme_page_number() {
    let (app, _state) = setup_app().await;
    let (status, body) = call(
        &app,
        "GET",
        "/api/content/blog?page=4294967295&limit=50",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_invalid_content_kind() {
    let (app, _state) = setup_app().await;
    let (status, _) = call(&app, "GET", "/api/content/podcast", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
