//! Router configuration for the HTTP API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    create_folder, delete_file, delete_folder, download_file, list_files, login, logout, me, move_file,
    register, rename_file, rename_folder, upload_file, AppState,
};
use super::middleware::{create_cors_layer, jwt_auth};

/// Room left for multipart framing on top of the file content itself.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// Create the main API router.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/session", get(me));

    let file_routes = Router::new()
        .route("/upload", post(upload_file))
        .route("/download/:id", get(download_file))
        .route("/list", get(list_files))
        .route("/:id", delete(delete_file))
        .route("/:id/rename", put(rename_file))
        .route("/:id/move", put(move_file));

    let folder_routes = Router::new()
        .route("/create", post(create_folder))
        .route("/:id", delete(delete_folder))
        .route("/:id/rename", put(rename_folder));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/files", file_routes)
        .nest("/folders", folder_routes);

    let body_limit = app_state
        .max_upload_size
        .saturating_add(MULTIPART_OVERHEAD)
        .try_into()
        .unwrap_or(usize::MAX);
    let tokens = app_state.tokens.clone();

    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(middleware::from_fn(move |req, next| {
                    jwt_auth(tokens.clone(), req, next)
                })),
        )
        .with_state(app_state)
        .merge(create_health_router())
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
