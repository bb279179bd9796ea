//! Folder types and repository for FileVault.
//!
//! Folders are stored flat, keyed by id, with a nullable `parent_id` and a
//! materialized `path` (`"Projects/2024"`). Every query is scoped by the
//! owning user id.

use sqlx::SqlitePool;

use crate::db::is_unique_violation;
use crate::{Result, VaultError};

/// A folder in a user's tree.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Folder {
    /// Unique folder ID.
    pub id: i64,
    /// Owning user ID.
    pub user_id: i64,
    /// Sanitized folder name, also the path segment on disk.
    pub name: String,
    /// Parent folder ID (None for root-level folders).
    pub parent_id: Option<i64>,
    /// Materialized path relative to the user's storage root.
    pub path: String,
    /// When the folder was created.
    pub created_at: String,
}

/// Data for creating a new folder.
#[derive(Debug, Clone)]
pub struct NewFolder {
    /// Owning user ID.
    pub user_id: i64,
    /// Sanitized folder name.
    pub name: String,
    /// Parent folder ID (None for root-level folders).
    pub parent_id: Option<i64>,
    /// Materialized path.
    pub path: String,
}

impl NewFolder {
    /// Create a root-level folder record.
    pub fn new(user_id: i64, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            user_id,
            path: name.clone(),
            name,
            parent_id: None,
        }
    }

    /// Place the folder under `parent`, deriving the path from it.
    pub fn with_parent(mut self, parent: &Folder) -> Self {
        self.parent_id = Some(parent.id);
        self.path = super::path::join_relative(&parent.path, &self.name);
        self
    }
}

/// Repository for folder operations.
pub struct FolderRepository<'a> {
    pool: &'a SqlitePool,
}

const FOLDER_COLUMNS: &str = "id, user_id, name, parent_id, path, created_at";

impl<'a> FolderRepository<'a> {
    /// Create a new FolderRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new folder.
    ///
    /// The parent, if any, must exist and belong to the same user.
    pub async fn create(&self, folder: &NewFolder) -> Result<Folder> {
        if let Some(parent_id) = folder.parent_id {
            if self.get(folder.user_id, parent_id).await?.is_none() {
                return Err(VaultError::NotFound("parent folder".to_string()));
            }
        }

        let result = sqlx::query(
            "INSERT INTO folders (user_id, name, parent_id, path) VALUES (?, ?, ?, ?)",
        )
        .bind(folder.user_id)
        .bind(&folder.name)
        .bind(folder.parent_id)
        .bind(&folder.path)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                VaultError::AlreadyExists(format!("folder '{}'", folder.path))
            } else {
                VaultError::Database(e.to_string())
            }
        })?;

        let id = result.last_insert_rowid();
        self.get(folder.user_id, id)
            .await?
            .ok_or_else(|| VaultError::NotFound("folder".to_string()))
    }

    /// Get a folder owned by `user_id`.
    pub async fn get(&self, user_id: i64, id: i64) -> Result<Option<Folder>> {
        let folder = sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(folder)
    }

    /// Find a direct child of `parent_id` (None for root) by name.
    pub async fn find_child_by_name(
        &self,
        user_id: i64,
        parent_id: Option<i64>,
        name: &str,
    ) -> Result<Option<Folder>> {
        let folder = sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders
             WHERE user_id = ? AND parent_id IS ? AND name = ?"
        ))
        .bind(user_id)
        .bind(parent_id)
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        Ok(folder)
    }

    /// List the immediate children of `parent_id` (None for root).
    ///
    /// Ordered by name (case-insensitive), ties broken by id.
    pub async fn list_children(&self, user_id: i64, parent_id: Option<i64>) -> Result<Vec<Folder>> {
        let folders = sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders
             WHERE user_id = ? AND parent_id IS ?
             ORDER BY name COLLATE NOCASE, id"
        ))
        .bind(user_id)
        .bind(parent_id)
        .fetch_all(self.pool)
        .await?;

        Ok(folders)
    }

    /// List every folder of a user, shallowest paths first.
    pub async fn list_all(&self, user_id: i64) -> Result<Vec<Folder>> {
        let folders = sqlx::query_as::<_, Folder>(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folders WHERE user_id = ? ORDER BY path, id"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(folders)
    }

    /// Delete a folder with all descendant folders and their files.
    ///
    /// Runs in one transaction. Returns the number of folders removed
    /// (0 when the folder does not exist for this user).
    pub async fn delete_tree(&self, user_id: i64, id: i64) -> Result<u64> {
        const SUBTREE: &str = "WITH RECURSIVE subtree(id) AS (
                SELECT id FROM folders WHERE id = ? AND user_id = ?
                UNION ALL
                SELECT f.id FROM folders f JOIN subtree s ON f.parent_id = s.id
            )";

        let mut tx = self.pool.begin().await?;

        // Child rows also go through ON DELETE CASCADE, which rows_affected
        // does not count.
        let count: i64 = sqlx::query_scalar(&format!("{SUBTREE} SELECT COUNT(*) FROM subtree"))
            .bind(id)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(&format!(
            "{SUBTREE} DELETE FROM files WHERE folder_id IN (SELECT id FROM subtree)"
        ))
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(&format!(
            "{SUBTREE} DELETE FROM folders WHERE id IN (SELECT id FROM subtree)"
        ))
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(count as u64)
    }

    /// Rename a folder and rewrite every descendant path in one transaction.
    ///
    /// Descendant folders get `new_path` in place of the old prefix, and so do
    /// the `file_path`s of all files below the folder.
    pub async fn rename(
        &self,
        user_id: i64,
        id: i64,
        new_name: &str,
        new_path: &str,
    ) -> Result<Folder> {
        let folder = self
            .get(user_id, id)
            .await?
            .ok_or_else(|| VaultError::NotFound("folder".to_string()))?;
        let old_path = folder.path;

        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE folders SET name = ?, path = ? WHERE id = ? AND user_id = ?")
            .bind(new_name)
            .bind(new_path)
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    VaultError::AlreadyExists(format!("folder '{new_path}'"))
                } else {
                    VaultError::Database(e.to_string())
                }
            })?;

        // Whole-segment prefix match: "Docs/" never matches "Docs2/".
        sqlx::query(
            "UPDATE folders SET path = ? || substr(path, length(?) + 1)
             WHERE user_id = ? AND substr(path, 1, length(?) + 1) = ? || '/'",
        )
        .bind(new_path)
        .bind(&old_path)
        .bind(user_id)
        .bind(&old_path)
        .bind(&old_path)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE files SET file_path = ? || substr(file_path, length(?) + 1),
                              updated_at = datetime('now')
             WHERE user_id = ? AND substr(file_path, 1, length(?) + 1) = ? || '/'",
        )
        .bind(new_path)
        .bind(&old_path)
        .bind(user_id)
        .bind(&old_path)
        .bind(&old_path)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get(user_id, id)
            .await?
            .ok_or_else(|| VaultError::NotFound("folder".to_string()))
    }
}
