use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use anonymail::api::AppState;
use anonymail::clients::{AliasProvider, ProviderError};
use anonymail::config::Config;
use anonymail::db::Store;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const ADMIN_PASSWORD: &str = "bootstrap-admin-pass";

struct NoProvider;

#[async_trait::async_trait]
impl AliasProvider for NoProvider {
    async fn generate_alias(&self, _token: &str) -> Result<String, ProviderError> {
        Err(ProviderError::NoAddress {
            status: 503,
            body: String::new(),
        })
    }
}

async fn spawn_app() -> (Arc<AppState>, Router) {
    let db_path =
        std::env::temp_dir().join(format!("anonymail-api-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.server.static_dir = "missing-static-dir".to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config.bootstrap.admin_password = Some(ADMIN_PASSWORD.to_string());

    let store = Store::new(&config.general.database_path)
        .await
        .expect("failed to open store");

    let state = anonymail::api::create_app_state(config, store, Arc::new(NoProvider), None)
        .expect("failed to create app state");

    anonymail::services::ensure_default_admin(&state.store, &state.hasher, Some(ADMIN_PASSWORD))
        .await
        .expect("failed to bootstrap admin");

    let router = anonymail::api::router(state.clone());
    (state, router)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", token);
    }

    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn register(app: &Router, username: &str, password: &str) -> StatusCode {
    let (status, _) = send(
        app,
        "POST",
        "/register",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await;
    status
}

async fn login(app: &Router, username: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await
}

async fn login_token(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = login(app, username, password).await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_register_login_and_admin_gate() {
    let (_state, app) = spawn_app().await;

    assert_eq!(
        register(&app, "alice", "password123").await,
        StatusCode::OK
    );

    let (status, body) = login(&app, "alice", "password123").await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap();
    assert!(!token.is_empty());
    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["isAdmin"], false);
    assert_eq!(body["user"]["needsPasswordReset"], false);

    let (status, body) = send(&app, "GET", "/check-auth", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["isAdmin"], false);

    let (status, body) = send(&app, "GET", "/admin/users", Some(token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_duplicate_registration_rejected() {
    let (_state, app) = spawn_app().await;

    assert_eq!(register(&app, "bob", "password123").await, StatusCode::OK);
    assert_eq!(
        register(&app, "bob", "another-pass").await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(register(&app, "", "password123").await, StatusCode::BAD_REQUEST);
    assert_eq!(register(&app, "carol", "").await, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_failures_look_identical() {
    let (_state, app) = spawn_app().await;
    register(&app, "alice", "password123").await;

    let (wrong_status, wrong_body) = login(&app, "alice", "not-the-password").await;
    let (unknown_status, unknown_body) = login(&app, "nobody", "not-the-password").await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
}

#[tokio::test]
async fn test_only_latest_login_token_is_valid() {
    let (_state, app) = spawn_app().await;
    register(&app, "alice", "password123").await;

    let mut tokens = Vec::new();
    for _ in 0..3 {
        tokens.push(login_token(&app, "alice", "password123").await);
    }

    let (last, older) = tokens.split_last().unwrap();
    for token in older {
        assert_ne!(token, last);
        let (status, _) = send(&app, "GET", "/check-auth", Some(token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, _) = send(&app, "GET", "/check-auth", Some(last), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_missing_and_unknown_tokens_rejected() {
    let (_state, app) = spawn_app().await;
    register(&app, "alice", "password123").await;
    let token = login_token(&app, "alice", "password123").await;

    let (status, body) = send(&app, "GET", "/check-auth", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authorization token required");

    let (status, body) = send(&app, "GET", "/check-auth", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid token");

    let bearer = format!("Bearer {token}");
    let (status, _) = send(&app, "GET", "/check-auth", Some(&bearer), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/admin/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_session_is_rejected_and_cleared() {
    let (state, app) = spawn_app().await;
    register(&app, "alice", "password123").await;
    let user = state
        .store
        .get_user_by_username("alice")
        .await
        .unwrap()
        .unwrap();

    let past = chrono::Utc::now() - chrono::Duration::hours(1);
    state
        .store
        .set_user_session(user.id, "expired-session-token", Some(past))
        .await
        .unwrap();

    let (status, body) = send(
        &app,
        "GET",
        "/check-auth",
        Some("expired-session-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid token");

    assert!(
        state
            .store
            .get_user_by_session_token("expired-session-token")
            .await
            .unwrap()
            .is_none()
    );
    let user = state.store.get_user(user.id).await.unwrap().unwrap();
    assert!(user.session_expires_at.is_none());
}

#[tokio::test]
async fn test_logout_ends_session() {
    let (_state, app) = spawn_app().await;
    register(&app, "alice", "password123").await;
    let token = login_token(&app, "alice", "password123").await;

    let (status, _) = send(&app, "POST", "/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/check-auth", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_change_password() {
    let (_state, app) = spawn_app().await;
    register(&app, "alice", "password123").await;
    let token = login_token(&app, "alice", "password123").await;

    let (status, body) = send(
        &app,
        "POST",
        "/change-password",
        Some(&token),
        Some(json!({ "old_password": "wrong-password", "new_password": "brand-new-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
    assert_eq!(
        login(&app, "alice", "password123").await.0,
        StatusCode::OK
    );

    // The login above replaced the session.
    let token = login_token(&app, "alice", "password123").await;

    let (status, _) = send(
        &app,
        "POST",
        "/change-password",
        Some(&token),
        Some(json!({ "old_password": "password123", "new_password": "short" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/change-password",
        Some(&token),
        Some(json!({ "old_password": "password123", "new_password": "brand-new-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/check-auth", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(
        login(&app, "alice", "password123").await.0,
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        login(&app, "alice", "brand-new-pass").await.0,
        StatusCode::OK
    );
}

#[tokio::test]
async fn test_bootstrap_admin_can_manage_users() {
    let (_state, app) = spawn_app().await;
    let admin_token = login_token(&app, "admin", ADMIN_PASSWORD).await;

    let (status, body) = send(&app, "GET", "/check-auth", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["isAdmin"], true);

    let (status, _) = send(
        &app,
        "POST",
        "/admin/create-user",
        Some(&admin_token),
        Some(json!({ "username": "dave", "password": "dave-password", "isAdmin": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "POST",
        "/admin/create-user",
        Some(&admin_token),
        Some(json!({ "username": "dave", "password": "dave-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "GET", "/admin/users", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let users = body["users"].as_array().unwrap();
    assert_eq!(users.len(), 2);
    let dave = users.iter().find(|u| u["Username"] == "dave").unwrap();
    assert_eq!(dave["IsAdmin"], false);
    assert!(dave["ID"].is_i64());
    assert!(dave.get("PasswordHash").is_none());
}

#[tokio::test]
async fn test_admin_reset_password_flags_and_revokes() {
    let (state, app) = spawn_app().await;
    register(&app, "alice", "password123").await;
    let user_token = login_token(&app, "alice", "password123").await;
    let admin_token = login_token(&app, "admin", ADMIN_PASSWORD).await;
    let alice = state
        .store
        .get_user_by_username("alice")
        .await
        .unwrap()
        .unwrap();

    let uri = format!("/admin/reset-password/{}", alice.id);
    let (status, _) = send(
        &app,
        "POST",
        &uri,
        Some(&admin_token),
        Some(json!({ "password": "short" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        &uri,
        Some(&admin_token),
        Some(json!({ "password": "temporary-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", "/check-auth", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = login(&app, "alice", "temporary-pass").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["needsPasswordReset"], true);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "POST",
        "/change-password",
        Some(&token),
        Some(json!({ "old_password": "temporary-pass", "new_password": "chosen-by-alice" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "GET", "/check-auth", Some(&token), None).await;
    assert_eq!(body["user"]["needsPasswordReset"], false);

    let (status, _) = send(
        &app,
        "POST",
        "/admin/reset-password/9999",
        Some(&admin_token),
        Some(json!({ "password": "temporary-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_delete_user_removes_owned_rows() {
    let (state, app) = spawn_app().await;
    register(&app, "alice", "password123").await;
    let user_token = login_token(&app, "alice", "password123").await;
    let admin_token = login_token(&app, "admin", ADMIN_PASSWORD).await;

    let (status, _) = send(
        &app,
        "POST",
        "/add-token",
        Some(&user_token),
        Some(json!({ "value": "ddg-token", "description": "main" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let alice = state
        .store
        .get_user_by_username("alice")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(state.store.list_tokens(alice.id).await.unwrap().len(), 1);

    let admin = state
        .store
        .get_user_by_username("admin")
        .await
        .unwrap()
        .unwrap();
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/admin/delete-user/{}", admin.id),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/admin/delete-user/{}", alice.id),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    assert!(state.store.get_user(alice.id).await.unwrap().is_none());
    assert!(state.store.list_tokens(alice.id).await.unwrap().is_empty());

    let (status, _) = send(&app, "GET", "/check-auth", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/admin/delete-user/{}", alice.id),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_promoted_admin_passes_gate() {
    let (_state, app) = spawn_app().await;
    let admin_token = login_token(&app, "admin", ADMIN_PASSWORD).await;

    send(
        &app,
        "POST",
        "/admin/create-user",
        Some(&admin_token),
        Some(json!({ "username": "erin", "password": "erin-password", "isAdmin": true })),
    )
    .await;

    let token = login_token(&app, "erin", "erin-password").await;
    let (status, _) = send(&app, "GET", "/admin/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_json_uses_error_shape() {
    let (_state, app) = spawn_app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/login")
        .header("Content-Type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_non_admin_is_forbidden_on_every_admin_route() {
    let (state, app) = spawn_app().await;
    register(&app, "alice", "password123").await;
    register(&app, "bob", "password123").await;
    let token = login_token(&app, "alice", "password123").await;
    let bob = state
        .store
        .get_user_by_username("bob")
        .await
        .unwrap()
        .unwrap();

    let delete_uri = format!("/admin/delete-user/{}", bob.id);
    let reset_uri = format!("/admin/reset-password/{}", bob.id);
    let routes = [
        ("GET", "/admin/users", None),
        (
            "POST",
            "/admin/create-user",
            Some(json!({ "username": "mallory", "password": "password123", "isAdmin": true })),
        ),
        ("DELETE", delete_uri.as_str(), None),
        (
            "POST",
            reset_uri.as_str(),
            Some(json!({ "password": "taken-over-pass" })),
        ),
        ("GET", "/metrics", None),
    ];

    for (method, uri, body) in routes {
        let (status, response) = send(&app, method, uri, Some(&token), body).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}");
        assert!(response["error"].is_string(), "{method} {uri}");
    }

    assert!(
        state
            .store
            .get_user_by_username("mallory")
            .await
            .unwrap()
            .is_none()
    );
    assert_eq!(login(&app, "bob", "password123").await.0, StatusCode::OK);
}

#[tokio::test]
async fn test_expiry_cleanup_leaves_newer_session_alone() {
    let (state, app) = spawn_app().await;
    register(&app, "alice", "password123").await;
    let user = state
        .store
        .get_user_by_username("alice")
        .await
        .unwrap()
        .unwrap();

    // A new login landed between reading the expired row and clearing it.
    state
        .store
        .set_user_session(user.id, "fresh-session-token", None)
        .await
        .unwrap();
    let cleared = state
        .store
        .clear_user_session_if(user.id, "expired-session-token")
        .await
        .unwrap();
    assert!(!cleared);

    let (status, body) = send(
        &app,
        "GET",
        "/check-auth",
        Some("fresh-session-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "alice");

    let cleared = state
        .store
        .clear_user_session_if(user.id, "fresh-session-token")
        .await
        .unwrap();
    assert!(cleared);
    let (status, _) = send(
        &app,
        "GET",
        "/check-auth",
        Some("fresh-session-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_change_password_checks_old_password_first() {
    let (_state, app) = spawn_app().await;
    register(&app, "alice", "password123").await;
    let token = login_token(&app, "alice", "password123").await;

    // Wrong old password that equals the new one must not reveal anything.
    let (status, _) = send(
        &app,
        "POST",
        "/change-password",
        Some(&token),
        Some(json!({ "old_password": "guessed-pass", "new_password": "guessed-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        "POST",
        "/change-password",
        Some(&token),
        Some(json!({ "old_password": "password123", "new_password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_non_numeric_path_id_uses_error_shape() {
    let (_state, app) = spawn_app().await;
    register(&app, "alice", "password123").await;
    let token = login_token(&app, "alice", "password123").await;
    let admin_token = login_token(&app, "admin", ADMIN_PASSWORD).await;

    for (uri, token) in [
        ("/address/abc", token.as_str()),
        ("/delete-token/abc", token.as_str()),
        ("/admin/delete-user/abc", admin_token.as_str()),
    ] {
        let (status, body) = send(&app, "DELETE", uri, Some(token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body["error"].is_string(), "{uri}");
    }
}

#[tokio::test]
async fn test_store_reports_unusable_database_directory() {
    let blocker =
        std::env::temp_dir().join(format!("anonymail-api-test-{}.file", uuid::Uuid::new_v4()));
    std::fs::write(&blocker, b"not a directory").unwrap();

    let db_url = format!("sqlite:{}", blocker.join("nested").join("app.db").display());
    let err = Store::new(&db_url).await.err().expect("store should fail");
    assert!(
        format!("{err:#}").contains("Failed to create database directory"),
        "{err:#}"
    );

    std::fs::remove_file(&blocker).ok();
}
