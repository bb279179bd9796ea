//! Response DTOs for the HTTP API.

use serde::Serialize;

use crate::datetime::to_rfc3339;
use crate::db::User;
use crate::file::{FileRecord, Folder, Listing};

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Plain acknowledgement.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable message.
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// User information in responses.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    /// User ID.
    pub id: i64,
    /// Username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Registration time (RFC 3339).
    pub created_at: String,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: to_rfc3339(&user.created_at),
        }
    }
}

/// Login and registration response.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Access token (JWT).
    pub access_token: String,
    /// Always `Bearer`.
    pub token_type: &'static str,
    /// Access token expiry in seconds.
    pub expires_in: u64,
    /// User information.
    pub user: UserInfo,
}

/// A stored file.
#[derive(Debug, Serialize)]
pub struct FileResponse {
    /// File ID.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Stored name on disk.
    pub filename: String,
    /// Containing folder (None for the root).
    pub folder_id: Option<i64>,
    /// Size in bytes.
    pub size: i64,
    /// MIME type.
    pub mime_type: String,
    /// Creation time (RFC 3339).
    pub created_at: String,
    /// Last update time (RFC 3339).
    pub updated_at: String,
    /// Always `file`.
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl From<FileRecord> for FileResponse {
    fn from(file: FileRecord) -> Self {
        Self {
            id: file.id,
            name: file.original_filename,
            filename: file.filename,
            folder_id: file.folder_id,
            size: file.file_size,
            mime_type: file.mime_type,
            created_at: to_rfc3339(&file.created_at),
            updated_at: to_rfc3339(&file.updated_at),
            kind: "file",
        }
    }
}

/// A folder.
#[derive(Debug, Serialize)]
pub struct FolderResponse {
    /// Folder ID.
    pub id: i64,
    /// Folder name.
    pub name: String,
    /// Parent folder (None for the root).
    pub parent_folder_id: Option<i64>,
    /// Full logical path.
    pub path: String,
    /// Creation time (RFC 3339).
    pub created_at: String,
    /// Always `folder`.
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl From<Folder> for FolderResponse {
    fn from(folder: Folder) -> Self {
        Self {
            id: folder.id,
            name: folder.name,
            parent_folder_id: folder.parent_id,
            path: folder.path,
            created_at: to_rfc3339(&folder.created_at),
            kind: "folder",
        }
    }
}

/// Contents of one folder.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    /// Subfolders.
    pub folders: Vec<FolderResponse>,
    /// Files.
    pub files: Vec<FileResponse>,
    /// The listed folder (None for the root).
    pub current_folder_id: Option<i64>,
}

impl From<Listing> for ListResponse {
    fn from(listing: Listing) -> Self {
        Self {
            folders: listing.folders.into_iter().map(Into::into).collect(),
            files: listing.files.into_iter().map(Into::into).collect(),
            current_folder_id: listing.current_folder_id,
        }
    }
}
