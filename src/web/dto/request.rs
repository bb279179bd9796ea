//! Request DTOs for the HTTP API.

use serde::Deserialize;
use validator::Validate;

/// User registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Username.
    #[validate(length(min = 1, max = 80, message = "Username must be 1-80 characters"))]
    pub username: String,
    /// Email address.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,
}

/// Login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address.
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Query for `GET /api/files/list`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Folder to list (omitted for the root).
    #[serde(default)]
    pub folder_id: Option<i64>,
}

/// Rename request for files and folders.
#[derive(Debug, Deserialize, Validate)]
pub struct RenameRequest {
    /// New display name.
    #[validate(length(min = 1, max = 255, message = "New name is required"))]
    pub new_name: String,
}

/// Move request for files.
#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    /// Destination folder (null for the root).
    #[serde(default)]
    pub folder_id: Option<i64>,
}

/// Folder creation request.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFolderRequest {
    /// Folder name.
    #[validate(length(min = 1, max = 255, message = "Folder name is required"))]
    pub name: String,
    /// Parent folder (null for the root).
    #[serde(default)]
    pub parent_folder_id: Option<i64>,
}
