//! Physical file storage for FileVault.
//!
//! Each user owns one directory below the base path, and the logical
//! folder tree is mirrored one-to-one inside it:
//! ```text
//! {base_path}/
//! ├── user_1/
//! │   ├── notes.txt
//! │   └── Projects/
//! │       └── 2024/
//! │           └── report.pdf
//! └── user_2/
//!     └── ...
//! ```
//! Paths coming from metadata always go through [`FileStorage::resolve`].

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::warn;

use super::path;
use crate::{Result, VaultError};

/// File storage service for managing physical files.
#[derive(Debug, Clone)]
pub struct FileStorage {
    /// Base directory holding every user root.
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a new FileStorage with the given base path.
    ///
    /// The base directory is created if it doesn't exist and stored in
    /// canonical form.
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path)?;
        let base_path = base_path.canonicalize()?;

        Ok(Self { base_path })
    }

    /// Get the base path of this storage.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Storage root of a user.
    pub fn user_root(&self, user_id: i64) -> PathBuf {
        self.base_path.join(format!("user_{user_id}"))
    }

    /// Create the user's storage root if needed.
    pub async fn ensure_user_root(&self, user_id: i64) -> Result<PathBuf> {
        let root = self.user_root(user_id);
        fs::create_dir_all(&root).await?;
        Ok(root)
    }

    /// Resolve a metadata path inside the user's root.
    pub fn resolve(&self, user_id: i64, relative: &str) -> Result<PathBuf> {
        path::resolve(&self.user_root(user_id), relative)
    }

    /// Create a directory and all missing parents.
    pub async fn create_dir(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).await?;
        Ok(())
    }

    /// Write `content` to a file that must not exist yet.
    ///
    /// Returns the number of bytes written. A partially written file is
    /// removed before the error is returned.
    pub async fn write_new(&self, target: &Path, content: &[u8]) -> Result<u64> {
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(target)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(VaultError::AlreadyExists(display_name(target)));
            }
            Err(e) => return Err(e.into()),
        };

        let written = async {
            file.write_all(content).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            drop(file);
            if let Err(cleanup) = fs::remove_file(target).await {
                warn!(path = %target.display(), error = %cleanup, "Failed to remove partial upload");
            }
            return Err(e.into());
        }

        Ok(fs::metadata(target).await?.len())
    }

    /// Read a whole file.
    pub async fn read(&self, target: &Path) -> Result<Vec<u8>> {
        match fs::read(target).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(VaultError::NotFound(format!("file {}", display_name(target))))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Check if an entry exists (without following a final symlink).
    pub async fn exists(&self, target: &Path) -> bool {
        fs::symlink_metadata(target).await.is_ok()
    }

    /// Check if an entry is a real directory (a symlink is not).
    pub async fn is_dir(&self, target: &Path) -> bool {
        fs::symlink_metadata(target)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
    }

    /// Rename `from` to `to`, refusing to replace an existing entry.
    pub async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        if self.exists(to).await {
            return Err(VaultError::AlreadyExists(display_name(to)));
        }
        fs::rename(from, to).await?;
        Ok(())
    }

    /// Delete a file.
    ///
    /// Returns `true` if the file was deleted, `false` if it didn't exist.
    pub async fn remove_file(&self, target: &Path) -> Result<bool> {
        match fs::remove_file(target).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a directory and everything below it.
    ///
    /// Returns `true` if the directory was deleted, `false` if it didn't exist.
    pub async fn remove_dir(&self, target: &Path) -> Result<bool> {
        match fs::remove_dir_all(target).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove a user's whole storage root.
    pub async fn remove_user_root(&self, user_id: i64) -> Result<bool> {
        self.remove_dir(&self.user_root(user_id)).await
    }
}

fn display_name(target: &Path) -> String {
    target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| target.display().to_string())
}
