//! FileVault - per-user file storage with a folder hierarchy.
//!
//! Each user owns a directory tree on disk that mirrors their folders one
//! to one. Metadata lives in SQLite; every physical path is derived from it
//! and checked to stay inside the user's storage root.

pub mod auth;
pub mod config;
pub mod datetime;
pub mod db;
pub mod error;
pub mod file;
pub mod logging;
pub mod web;

pub use auth::{hash_password, verify_password, Claims, TokenService};
pub use config::Config;
pub use db::{Database, NewUser, User, UserRepository};
pub use error::{Result, VaultError};
pub use file::{FileRecord, FileService, FileStorage, Folder, UploadRequest};
pub use web::WebServer;
