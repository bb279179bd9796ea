//! Test helpers shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;

use filevault::auth::TokenService;
use filevault::config::Config;
use filevault::db::{NewUser, UserRepository};
use filevault::file::{FileService, FileStorage};
use filevault::web::{create_router, AppState};
use filevault::Database;

/// JWT secret used by every test server.
pub const TEST_SECRET: &str = "test-secret-key-for-testing-only";

/// An HTTP test server plus direct access to the engine behind it.
pub struct TestApp {
    pub server: TestServer,
    pub files: FileService,
    // Keeps the storage directory alive for the test's duration.
    pub dir: TempDir,
}

/// Engine over an in-memory database and a temporary storage root.
pub async fn create_service() -> (TempDir, FileService) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let storage = FileStorage::new(dir.path().join("uploads")).expect("Failed to create storage");
    let service = FileService::new(db, storage, Config::default().files.allowed_extensions);
    (dir, service)
}

/// Create a user row directly and return its id.
pub async fn create_user(service: &FileService, username: &str) -> i64 {
    UserRepository::new(service.db().pool())
        .create(&NewUser::new(
            username,
            format!("{username}@example.com"),
            "not-a-real-hash",
        ))
        .await
        .expect("Failed to create user")
        .id
}

/// Create a test server with the given upload ceiling in bytes.
pub async fn create_test_app_with_limit(max_upload_size: u64) -> TestApp {
    let (dir, files) = create_service().await;
    let state = Arc::new(AppState::new(
        files.clone(),
        TokenService::new(TEST_SECRET, 900),
        max_upload_size,
    ));
    let router = create_router(state, &[]);
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp { server, files, dir }
}

/// Create a test server with a 1 MiB upload ceiling.
pub async fn create_test_app() -> TestApp {
    create_test_app_with_limit(1024 * 1024).await
}

/// Register a user over HTTP and return the response body.
pub async fn register_user(server: &TestServer, username: &str, password: &str) -> Value {
    server
        .post("/api/auth/register")
        .json(&json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": password
        }))
        .await
        .json::<Value>()
}

/// Register a user and return (user id, access token).
pub async fn register_and_login(server: &TestServer, username: &str) -> (i64, String) {
    let body = register_user(server, username, "password123").await;
    let id = body["data"]["user"]["id"]
        .as_i64()
        .expect("registration response has a user id");
    let token = body["data"]["access_token"]
        .as_str()
        .expect("registration response has a token")
        .to_string();
    (id, token)
}

/// Authorization header value for a token.
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
