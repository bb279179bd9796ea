//! File management module for FileVault.
//!
//! This module maps each user's logical tree of folders and files onto a
//! physical directory below that user's storage root:
//! - Sandboxed path resolution
//! - Name sanitizing and collision handling
//! - Folder and file metadata
//! - The storage engine keeping disk and metadata consistent
//! - Listing and reconciliation

mod folder;
mod locks;
mod metadata;
mod navigator;
pub mod naming;
pub mod path;
mod reconcile;
mod service;
mod storage;

pub use folder::{Folder, FolderRepository, NewFolder};
pub use locks::UserLocks;
pub use metadata::{FileRecord, FileRepository, FileUpdate, NewFile};
pub use navigator::{HierarchyNavigator, Listing};
pub use reconcile::{scan_user, ReconcileReport};
pub use service::{DownloadResult, FileService, UploadRequest};
pub use storage::FileStorage;

/// Maximum length of a stored file or folder name, in bytes.
pub const MAX_NAME_LENGTH: usize = 255;
