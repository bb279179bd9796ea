//! File metadata types and repository for FileVault.

use sqlx::{QueryBuilder, SqlitePool};

use crate::db::is_unique_violation;
use crate::{Result, VaultError};

/// Metadata for a stored file.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FileRecord {
    /// Unique file ID.
    pub id: i64,
    /// Owning user ID.
    pub user_id: i64,
    /// Containing folder (None for the user's root).
    pub folder_id: Option<i64>,
    /// Stored, collision-free name on disk.
    pub filename: String,
    /// Name supplied by the user, used for display and download.
    pub original_filename: String,
    /// Path relative to the user's storage root.
    pub file_path: String,
    /// Size in bytes.
    pub file_size: i64,
    /// MIME type derived from the name.
    pub mime_type: String,
    /// When the file was uploaded.
    pub created_at: String,
    /// Last rename or move.
    pub updated_at: String,
}

/// Data for creating a new file entry.
#[derive(Debug, Clone)]
pub struct NewFile {
    /// Owning user ID.
    pub user_id: i64,
    /// Containing folder (None for the user's root).
    pub folder_id: Option<i64>,
    /// Stored name.
    pub filename: String,
    /// Display name.
    pub original_filename: String,
    /// Path relative to the user's storage root.
    pub file_path: String,
    /// Size in bytes.
    pub file_size: i64,
    /// MIME type.
    pub mime_type: String,
}

/// Builder for updating a file entry.
#[derive(Debug, Clone, Default)]
pub struct FileUpdate {
    /// New containing folder.
    pub folder_id: Option<Option<i64>>,
    /// New stored name.
    pub filename: Option<String>,
    /// New display name.
    pub original_filename: Option<String>,
    /// New relative path.
    pub file_path: Option<String>,
    /// New MIME type.
    pub mime_type: Option<String>,
}

impl FileUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the containing folder.
    pub fn folder_id(mut self, folder_id: Option<i64>) -> Self {
        self.folder_id = Some(folder_id);
        self
    }

    /// Set the stored name.
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Set the display name.
    pub fn original_filename(mut self, name: impl Into<String>) -> Self {
        self.original_filename = Some(name.into());
        self
    }

    /// Set the relative path.
    pub fn file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// Set the MIME type.
    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Check if any fields are set.
    pub fn is_empty(&self) -> bool {
        self.folder_id.is_none()
            && self.filename.is_none()
            && self.original_filename.is_none()
            && self.file_path.is_none()
            && self.mime_type.is_none()
    }
}

/// Repository for file metadata operations.
pub struct FileRepository<'a> {
    pool: &'a SqlitePool,
}

const FILE_COLUMNS: &str = "id, user_id, folder_id, filename, original_filename, file_path, \
                            file_size, mime_type, created_at, updated_at";

impl<'a> FileRepository<'a> {
    /// Create a new FileRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    async fn ensure_folder(&self, user_id: i64, folder_id: Option<i64>) -> Result<()> {
        let Some(folder_id) = folder_id else {
            return Ok(());
        };
        let owned: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM folders WHERE id = ? AND user_id = ?")
                .bind(folder_id)
                .bind(user_id)
                .fetch_one(self.pool)
                .await?;
        if owned == 0 {
            return Err(VaultError::NotFound("folder".to_string()));
        }
        Ok(())
    }

    /// Create a new file entry.
    ///
    /// The folder, if any, must exist and belong to the same user.
    pub async fn create(&self, file: &NewFile) -> Result<FileRecord> {
        self.ensure_folder(file.user_id, file.folder_id).await?;

        let result = sqlx::query(
            "INSERT INTO files (user_id, folder_id, filename, original_filename, file_path,
                                file_size, mime_type)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(file.user_id)
        .bind(file.folder_id)
        .bind(&file.filename)
        .bind(&file.original_filename)
        .bind(&file.file_path)
        .bind(file.file_size)
        .bind(&file.mime_type)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                VaultError::AlreadyExists(format!("file '{}'", file.file_path))
            } else {
                VaultError::Database(e.to_string())
            }
        })?;

        let id = result.last_insert_rowid();
        self.get(file.user_id, id)
            .await?
            .ok_or_else(|| VaultError::NotFound("file".to_string()))
    }

    /// Get a file owned by `user_id`.
    pub async fn get(&self, user_id: i64, id: i64) -> Result<Option<FileRecord>> {
        let file = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(file)
    }

    /// List the files directly inside `folder_id` (None for root).
    ///
    /// Ordered by display name (case-insensitive), ties broken by id.
    pub async fn list_in_folder(
        &self,
        user_id: i64,
        folder_id: Option<i64>,
    ) -> Result<Vec<FileRecord>> {
        let files = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files
             WHERE user_id = ? AND folder_id IS ?
             ORDER BY original_filename COLLATE NOCASE, id"
        ))
        .bind(user_id)
        .bind(folder_id)
        .fetch_all(self.pool)
        .await?;

        Ok(files)
    }

    /// List every file of a user.
    pub async fn list_all(&self, user_id: i64) -> Result<Vec<FileRecord>> {
        let files = sqlx::query_as::<_, FileRecord>(&format!(
            "SELECT {FILE_COLUMNS} FROM files WHERE user_id = ? ORDER BY file_path, id"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(files)
    }

    /// Update a file entry and bump `updated_at`.
    ///
    /// Returns the updated record, or None if not found for this user.
    pub async fn update(
        &self,
        user_id: i64,
        id: i64,
        update: &FileUpdate,
    ) -> Result<Option<FileRecord>> {
        if update.is_empty() {
            return self.get(user_id, id).await;
        }
        if let Some(folder_id) = update.folder_id {
            self.ensure_folder(user_id, folder_id).await?;
        }

        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new("UPDATE files SET updated_at = datetime('now')");

        if let Some(folder_id) = update.folder_id {
            query.push(", folder_id = ");
            query.push_bind(folder_id);
        }
        if let Some(ref filename) = update.filename {
            query.push(", filename = ");
            query.push_bind(filename);
        }
        if let Some(ref original_filename) = update.original_filename {
            query.push(", original_filename = ");
            query.push_bind(original_filename);
        }
        if let Some(ref file_path) = update.file_path {
            query.push(", file_path = ");
            query.push_bind(file_path);
        }
        if let Some(ref mime_type) = update.mime_type {
            query.push(", mime_type = ");
            query.push_bind(mime_type);
        }

        query.push(" WHERE id = ");
        query.push_bind(id);
        query.push(" AND user_id = ");
        query.push_bind(user_id);

        let result = query.build().execute(self.pool).await.map_err(|e| {
            if is_unique_violation(&e) {
                VaultError::AlreadyExists("file path".to_string())
            } else {
                VaultError::Database(e.to_string())
            }
        })?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get(user_id, id).await
    }

    /// Delete a file entry.
    ///
    /// Returns true if a row was deleted.
    pub async fn delete(&self, user_id: i64, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
