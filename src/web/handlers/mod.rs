//! API handlers.

pub mod auth;
pub mod file;
pub mod folder;

pub use auth::*;
pub use file::*;
pub use folder::*;

use std::sync::Arc;

use crate::auth::TokenService;
use crate::db::Database;
use crate::file::FileService;

/// Application state shared across handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Database handle.
    pub db: Database,
    /// Storage engine.
    pub files: FileService,
    /// Access token issuer and verifier.
    pub tokens: Arc<TokenService>,
    /// Upload size ceiling in bytes.
    pub max_upload_size: u64,
}

impl AppState {
    /// Create a new application state.
    pub fn new(files: FileService, tokens: TokenService, max_upload_size: u64) -> Self {
        Self {
            db: files.db().clone(),
            files,
            tokens: Arc::new(tokens),
            max_upload_size,
        }
    }
}
