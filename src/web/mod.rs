//! HTTP API for FileVault.
//!
//! A thin axum layer over [`crate::file::FileService`]: it authenticates the
//! caller, enforces the upload ceiling, and maps engine errors to statuses.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
