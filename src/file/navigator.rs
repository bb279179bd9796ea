//! Listing of a folder's immediate children.

use crate::db::Database;
use crate::{Result, VaultError};

use super::folder::{Folder, FolderRepository};
use super::metadata::{FileRecord, FileRepository};

/// Immediate contents of one folder.
#[derive(Debug, Clone)]
pub struct Listing {
    /// Subfolders, by name.
    pub folders: Vec<Folder>,
    /// Files, by display name.
    pub files: Vec<FileRecord>,
    /// The listed folder (None for the user's root).
    pub current_folder_id: Option<i64>,
}

/// Read-only view over a user's folder tree.
pub struct HierarchyNavigator<'a> {
    db: &'a Database,
}

impl<'a> HierarchyNavigator<'a> {
    /// Create a navigator over the given database.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// List the folders and files directly inside `folder_id`.
    ///
    /// An unknown folder, or one owned by someone else, is `NotFound`.
    pub async fn list_children(&self, user_id: i64, folder_id: Option<i64>) -> Result<Listing> {
        let folders = FolderRepository::new(self.db.pool());

        if let Some(id) = folder_id {
            if folders.get(user_id, id).await?.is_none() {
                return Err(VaultError::NotFound("folder".to_string()));
            }
        }

        let subfolders = folders.list_children(user_id, folder_id).await?;
        let files = FileRepository::new(self.db.pool())
            .list_in_folder(user_id, folder_id)
            .await?;

        Ok(Listing {
            folders: subfolders,
            files,
            current_folder_id: folder_id,
        })
    }

    /// Chain of folders from the root down to `folder_id`, inclusive.
    pub async fn breadcrumbs(&self, user_id: i64, folder_id: i64) -> Result<Vec<Folder>> {
        let folders = FolderRepository::new(self.db.pool());
        let mut chain = Vec::new();
        let mut current = Some(folder_id);

        while let Some(id) = current {
            let folder = folders
                .get(user_id, id)
                .await?
                .ok_or_else(|| VaultError::NotFound("folder".to_string()))?;
            current = folder.parent_id;
            chain.push(folder);
        }

        chain.reverse();
        Ok(chain)
    }
}
