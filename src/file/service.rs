//! File service for FileVault.
//!
//! This module coordinates physical storage with metadata:
//! - Upload and download
//! - Rename and move with disk and metadata kept in lockstep
//! - Folder creation and recursive deletion
//! - Purging a user's whole storage
//!
//! Every operation holds the owning user's lock for its whole duration.
//! Physical steps come first for rename/move/folder delete; when the
//! metadata step then fails the error is logged and reported as
//! [`VaultError::Inconsistent`] instead of being rolled back.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::db::{Database, UserRepository};
use crate::{Result, VaultError};

use super::folder::{Folder, FolderRepository, NewFolder};
use super::locks::UserLocks;
use super::metadata::{FileRecord, FileRepository, FileUpdate, NewFile};
use super::naming::{self, disambiguate, sanitize};
use super::path::{join_relative, parent_of};
use super::reconcile::{self, ReconcileReport};
use super::storage::FileStorage;

/// Request data for file upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Folder to upload into (None for the user's root).
    pub folder_id: Option<i64>,
    /// Name supplied by the client.
    pub filename: String,
    /// File content.
    pub content: Vec<u8>,
}

impl UploadRequest {
    /// Create a new upload request into the user's root.
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            folder_id: None,
            filename: filename.into(),
            content: content.into(),
        }
    }

    /// Set the destination folder.
    pub fn in_folder(mut self, folder_id: i64) -> Self {
        self.folder_id = Some(folder_id);
        self
    }
}

/// Result of a file download.
#[derive(Debug)]
pub struct DownloadResult {
    /// File metadata (display name and MIME type included).
    pub file: FileRecord,
    /// File content.
    pub content: Vec<u8>,
}

/// Storage engine for a user's files and folders.
#[derive(Debug, Clone)]
pub struct FileService {
    db: Database,
    storage: FileStorage,
    locks: UserLocks,
    allowed_extensions: Arc<Vec<String>>,
}

impl FileService {
    /// Create a new FileService.
    pub fn new(db: Database, storage: FileStorage, allowed_extensions: Vec<String>) -> Self {
        Self {
            db,
            storage,
            locks: UserLocks::new(),
            allowed_extensions: Arc::new(
                allowed_extensions
                    .into_iter()
                    .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                    .collect(),
            ),
        }
    }

    /// Get the physical storage.
    pub fn storage(&self) -> &FileStorage {
        &self.storage
    }

    /// Get the database.
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Extensions accepted for upload.
    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    fn check_extension(&self, name: &str) -> Result<()> {
        if naming::is_allowed_extension(name, &self.allowed_extensions) {
            Ok(())
        } else {
            Err(VaultError::UnsupportedType(
                naming::extension_of(name).unwrap_or_else(|| name.to_string()),
            ))
        }
    }

    async fn owned_folder(&self, user_id: i64, folder_id: i64) -> Result<Folder> {
        FolderRepository::new(self.db.pool())
            .get(user_id, folder_id)
            .await?
            .ok_or_else(|| VaultError::NotFound("folder".to_string()))
    }

    async fn owned_file(&self, user_id: i64, file_id: i64) -> Result<FileRecord> {
        FileRepository::new(self.db.pool())
            .get(user_id, file_id)
            .await?
            .ok_or_else(|| VaultError::NotFound("file".to_string()))
    }

    /// Upload a file.
    ///
    /// The content is written under a sanitized, collision-free name before
    /// the row is inserted. If the insert fails the written file is removed.
    pub async fn upload(&self, user_id: i64, request: &UploadRequest) -> Result<FileRecord> {
        let _guard = self.locks.acquire(user_id).await;

        let folder = match request.folder_id {
            Some(id) => Some(self.owned_folder(user_id, id).await?),
            None => None,
        };

        let display_name = request.filename.trim();
        self.check_extension(display_name)?;
        let safe_name = sanitize(display_name)?;
        self.check_extension(&safe_name)?;

        let dir_rel = folder.as_ref().map(|f| f.path.as_str()).unwrap_or("");
        self.storage.ensure_user_root(user_id).await?;
        let dir = self.storage.resolve(user_id, dir_rel)?;
        self.storage.create_dir(&dir).await?;

        let taken: HashSet<String> = FileRepository::new(self.db.pool())
            .list_in_folder(user_id, request.folder_id)
            .await?
            .into_iter()
            .map(|f| f.filename)
            .collect();
        let stored_name = disambiguate(&dir, &safe_name, &taken).await?;
        let file_path = join_relative(dir_rel, &stored_name);
        let target = self.storage.resolve(user_id, &file_path)?;

        let size = self.storage.write_new(&target, &request.content).await?;

        let new_file = NewFile {
            user_id,
            folder_id: request.folder_id,
            filename: stored_name,
            original_filename: display_name.to_string(),
            file_path,
            file_size: size as i64,
            mime_type: naming::mime_type(display_name),
        };

        match FileRepository::new(self.db.pool()).create(&new_file).await {
            Ok(file) => {
                info!(user_id, file_id = file.id, path = %file.file_path, size, "File uploaded");
                Ok(file)
            }
            Err(e) => {
                if let Err(cleanup) = self.storage.remove_file(&target).await {
                    warn!(user_id, path = %new_file.file_path, error = %cleanup,
                        "Failed to remove file after metadata insert failed");
                }
                Err(e)
            }
        }
    }

    /// Download a file owned by the user.
    pub async fn download(&self, user_id: i64, file_id: i64) -> Result<DownloadResult> {
        let _guard = self.locks.acquire(user_id).await;

        let file = self.owned_file(user_id, file_id).await?;
        let target = self.storage.resolve(user_id, &file.file_path)?;
        let content = self.storage.read(&target).await?;

        Ok(DownloadResult { file, content })
    }

    /// Rename a file.
    ///
    /// The new name is sanitized for storage and kept verbatim as the
    /// display name; it must keep an allowed extension.
    pub async fn rename_file(
        &self,
        user_id: i64,
        file_id: i64,
        new_name: &str,
    ) -> Result<FileRecord> {
        let _guard = self.locks.acquire(user_id).await;

        let file = self.owned_file(user_id, file_id).await?;
        let display_name = new_name.trim();
        self.check_extension(display_name)?;
        let safe_name = sanitize(display_name)?;
        self.check_extension(&safe_name)?;

        let new_path = join_relative(parent_of(&file.file_path), &safe_name);
        let update = FileUpdate::new()
            .filename(&safe_name)
            .original_filename(display_name)
            .file_path(&new_path)
            .mime_type(naming::mime_type(display_name));

        if new_path != file.file_path {
            self.relocate(user_id, &file.file_path, &new_path).await?;
        }

        let updated = self
            .finish_metadata(
                FileRepository::new(self.db.pool())
                    .update(user_id, file_id, &update)
                    .await,
                user_id,
                "rename file",
                &new_path,
            )?
            .ok_or_else(|| inconsistent(user_id, "rename file", &new_path, "row vanished"))?;

        info!(user_id, file_id, path = %updated.file_path, "File renamed");
        Ok(updated)
    }

    /// Move a file into another folder (None for the user's root).
    pub async fn move_file(
        &self,
        user_id: i64,
        file_id: i64,
        folder_id: Option<i64>,
    ) -> Result<FileRecord> {
        let _guard = self.locks.acquire(user_id).await;

        let file = self.owned_file(user_id, file_id).await?;
        let folder = match folder_id {
            Some(id) => Some(self.owned_folder(user_id, id).await?),
            None => None,
        };

        let dir_rel = folder.as_ref().map(|f| f.path.as_str()).unwrap_or("");
        let new_path = join_relative(dir_rel, &file.filename);
        if new_path == file.file_path && folder_id == file.folder_id {
            return Ok(file);
        }

        let dir = self.storage.resolve(user_id, dir_rel)?;
        self.storage.create_dir(&dir).await?;
        self.relocate(user_id, &file.file_path, &new_path).await?;

        let update = FileUpdate::new().folder_id(folder_id).file_path(&new_path);
        let updated = self
            .finish_metadata(
                FileRepository::new(self.db.pool())
                    .update(user_id, file_id, &update)
                    .await,
                user_id,
                "move file",
                &new_path,
            )?
            .ok_or_else(|| inconsistent(user_id, "move file", &new_path, "row vanished"))?;

        info!(user_id, file_id, folder_id = ?folder_id, path = %updated.file_path, "File moved");
        Ok(updated)
    }

    /// Delete a file: row first, then the physical file.
    ///
    /// A file already missing on disk only produces a warning; a failed
    /// removal leaves an orphan and is reported as `Inconsistent`.
    pub async fn delete_file(&self, user_id: i64, file_id: i64) -> Result<()> {
        let _guard = self.locks.acquire(user_id).await;

        let file = self.owned_file(user_id, file_id).await?;
        let target = self.storage.resolve(user_id, &file.file_path)?;

        if !FileRepository::new(self.db.pool())
            .delete(user_id, file_id)
            .await?
        {
            return Err(VaultError::NotFound("file".to_string()));
        }

        match self.storage.remove_file(&target).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(user_id, file_id, path = %file.file_path, "Deleted file was already missing on disk");
            }
            Err(e) => {
                return Err(inconsistent(
                    user_id,
                    "delete file",
                    &file.file_path,
                    &format!("orphan left on disk: {e}"),
                ));
            }
        }

        info!(user_id, file_id, path = %file.file_path, "File deleted");
        Ok(())
    }

    /// Create a folder (under `parent_id`, or at the user's root).
    pub async fn create_folder(
        &self,
        user_id: i64,
        name: &str,
        parent_id: Option<i64>,
    ) -> Result<Folder> {
        let _guard = self.locks.acquire(user_id).await;

        let parent = match parent_id {
            Some(id) => Some(
                FolderRepository::new(self.db.pool())
                    .get(user_id, id)
                    .await?
                    .ok_or_else(|| VaultError::NotFound("parent folder".to_string()))?,
            ),
            None => None,
        };

        let safe_name = sanitize(name)?;
        let folders = FolderRepository::new(self.db.pool());
        if folders
            .find_child_by_name(user_id, parent_id, &safe_name)
            .await?
            .is_some()
        {
            return Err(VaultError::AlreadyExists(format!("folder '{safe_name}'")));
        }

        let mut new_folder = NewFolder::new(user_id, safe_name);
        if let Some(ref parent) = parent {
            new_folder = new_folder.with_parent(parent);
        }

        self.storage.ensure_user_root(user_id).await?;
        let dir = self.storage.resolve(user_id, &new_folder.path)?;
        let existed = self.storage.exists(&dir).await;
        if existed && !self.storage.is_dir(&dir).await {
            return Err(VaultError::AlreadyExists(format!("file '{}'", new_folder.name)));
        }
        self.storage.create_dir(&dir).await?;

        match folders.create(&new_folder).await {
            Ok(folder) => {
                info!(user_id, folder_id = folder.id, path = %folder.path, "Folder created");
                Ok(folder)
            }
            Err(e) => {
                if !existed {
                    if let Err(cleanup) = self.storage.remove_dir(&dir).await {
                        warn!(user_id, path = %new_folder.path, error = %cleanup,
                            "Failed to remove directory after metadata insert failed");
                    }
                }
                Err(e)
            }
        }
    }

    /// Rename a folder, rewriting the paths of everything below it.
    pub async fn rename_folder(
        &self,
        user_id: i64,
        folder_id: i64,
        new_name: &str,
    ) -> Result<Folder> {
        let _guard = self.locks.acquire(user_id).await;

        let folder = self.owned_folder(user_id, folder_id).await?;
        let safe_name = sanitize(new_name)?;

        let folders = FolderRepository::new(self.db.pool());
        if let Some(sibling) = folders
            .find_child_by_name(user_id, folder.parent_id, &safe_name)
            .await?
        {
            if sibling.id != folder.id {
                return Err(VaultError::AlreadyExists(format!("folder '{safe_name}'")));
            }
        }

        let new_path = join_relative(parent_of(&folder.path), &safe_name);
        if new_path == folder.path {
            return Ok(folder);
        }

        self.relocate(user_id, &folder.path, &new_path).await?;

        let renamed = self.finish_metadata(
            folders
                .rename(user_id, folder_id, &safe_name, &new_path)
                .await,
            user_id,
            "rename folder",
            &new_path,
        )?;

        info!(user_id, folder_id, path = %renamed.path, "Folder renamed");
        Ok(renamed)
    }

    /// Delete a folder: physical subtree first, then the metadata subtree.
    pub async fn delete_folder(&self, user_id: i64, folder_id: i64) -> Result<()> {
        let _guard = self.locks.acquire(user_id).await;

        let folder = self.owned_folder(user_id, folder_id).await?;
        let target = self.storage.resolve(user_id, &folder.path)?;

        if !self.storage.remove_dir(&target).await? {
            warn!(user_id, folder_id, path = %folder.path, "Deleted folder was already missing on disk");
        }

        let removed = self.finish_metadata(
            FolderRepository::new(self.db.pool())
                .delete_tree(user_id, folder_id)
                .await,
            user_id,
            "delete folder",
            &folder.path,
        )?;

        info!(user_id, folder_id, path = %folder.path, folders = removed, "Folder deleted");
        Ok(())
    }

    /// Remove a user's storage root, then the user row.
    ///
    /// Folder and file rows cascade with the user. Returns false when the
    /// user did not exist.
    pub async fn purge_user(&self, user_id: i64) -> Result<bool> {
        let guard = self.locks.acquire(user_id).await;

        self.storage.remove_user_root(user_id).await?;
        let existed = self.finish_metadata(
            UserRepository::new(self.db.pool()).delete(user_id).await,
            user_id,
            "purge user",
            "",
        )?;

        drop(guard);
        self.locks.forget(user_id);

        info!(user_id, existed, "User storage purged");
        Ok(existed)
    }

    /// Compare the user's metadata with their storage root without
    /// changing anything.
    pub async fn scan_user(&self, user_id: i64) -> Result<ReconcileReport> {
        let _guard = self.locks.acquire(user_id).await;
        reconcile::scan_user(&self.db, &self.storage, user_id).await
    }

    /// Physically move `from` to `to` (both relative to the user's root).
    ///
    /// A missing source means metadata already points at nothing.
    async fn relocate(&self, user_id: i64, from: &str, to: &str) -> Result<()> {
        let source = self.storage.resolve(user_id, from)?;
        let destination = self.storage.resolve(user_id, to)?;

        if self.storage.exists(&destination).await {
            return Err(VaultError::AlreadyExists(to.to_string()));
        }
        if !self.storage.exists(&source).await {
            return Err(inconsistent(user_id, "relocate", from, "source missing on disk"));
        }

        self.storage.rename(&source, &destination).await
    }

    /// Map a metadata failure that follows a completed physical step.
    fn finish_metadata<T>(
        &self,
        result: Result<T>,
        user_id: i64,
        op: &str,
        path: &str,
    ) -> Result<T> {
        result.map_err(|e| inconsistent(user_id, op, path, &e.to_string()))
    }
}

fn inconsistent(user_id: i64, op: &str, path: &str, detail: &str) -> VaultError {
    error!(user_id, path, op, detail, "Storage and metadata out of sync");
    VaultError::Inconsistent(format!("{op} '{path}': {detail}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::NewUser;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        service: FileService,
        alice: i64,
        bob: i64,
    }

    async fn setup() -> Fixture {
        let dir = TempDir::new().unwrap();
        let db = Database::open_in_memory().await.unwrap();
        let users = UserRepository::new(db.pool());
        let alice = users
            .create(&NewUser::new("alice", "alice@example.com", "pw"))
            .await
            .unwrap()
            .id;
        let bob = users
            .create(&NewUser::new("bob", "bob@example.com", "pw"))
            .await
            .unwrap()
            .id;
        let storage = FileStorage::new(dir.path().join("uploads")).unwrap();
        let allowed = vec!["txt".to_string(), "pdf".to_string(), "md".to_string()];
        Fixture {
            _dir: dir,
            service: FileService::new(db, storage, allowed),
            alice,
            bob,
        }
    }

    #[tokio::test]
    async fn test_upload_to_root() {
        let f = setup().await;

        let file = f
            .service
            .upload(f.alice, &UploadRequest::new("my notes.txt", b"hello".to_vec()))
            .await
            .unwrap();

        assert_eq!(file.filename, "my-notes.txt");
        assert_eq!(file.original_filename, "my notes.txt");
        assert_eq!(file.file_path, "my-notes.txt");
        assert_eq!(file.file_size, 5);
        assert_eq!(file.mime_type, "text/plain");
        assert!(f.service.storage().user_root(f.alice).join("my-notes.txt").is_file());
    }

    #[tokio::test]
    async fn test_upload_into_folder() {
        let f = setup().await;
        let docs = f.service.create_folder(f.alice, "Docs", None).await.unwrap();

        let file = f
            .service
            .upload(f.alice, &UploadRequest::new("a.pdf", b"%PDF".to_vec()).in_folder(docs.id))
            .await
            .unwrap();

        assert_eq!(file.folder_id, Some(docs.id));
        assert_eq!(file.file_path, "Docs/a.pdf");
        assert_eq!(file.mime_type, "application/pdf");
    }

    #[tokio::test]
    async fn test_upload_rejects_extension() {
        let f = setup().await;

        let result = f
            .service
            .upload(f.alice, &UploadRequest::new("setup.exe", b"MZ".to_vec()))
            .await;

        assert!(matches!(result, Err(VaultError::UnsupportedType(ext)) if ext == "exe"));
        let root = f.service.storage().user_root(f.alice);
        assert!(!root.join("setup.exe").exists());
    }

    #[tokio::test]
    async fn test_upload_into_foreign_folder() {
        let f = setup().await;
        let docs = f.service.create_folder(f.alice, "Docs", None).await.unwrap();

        let result = f
            .service
            .upload(f.bob, &UploadRequest::new("a.txt", b"x".to_vec()).in_folder(docs.id))
            .await;

        assert!(matches!(result, Err(VaultError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_upload_invalid_name() {
        let f = setup().await;

        let result = f
            .service
            .upload(f.alice, &UploadRequest::new("...txt", b"x".to_vec()))
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_upload_same_name_twice() {
        let f = setup().await;

        let first = f
            .service
            .upload(f.alice, &UploadRequest::new("a.txt", b"one".to_vec()))
            .await
            .unwrap();
        let second = f
            .service
            .upload(f.alice, &UploadRequest::new("a.txt", b"two".to_vec()))
            .await
            .unwrap();

        assert_eq!(first.filename, "a.txt");
        assert_eq!(second.filename, "a_1.txt");
        assert_eq!(second.original_filename, "a.txt");

        let one = f.service.download(f.alice, first.id).await.unwrap();
        let two = f.service.download(f.alice, second.id).await.unwrap();
        assert_eq!(one.content, b"one");
        assert_eq!(two.content, b"two");
    }

    #[tokio::test]
    async fn test_upload_non_ascii_name() {
        let f = setup().await;

        let cjk = f
            .service
            .upload(f.alice, &UploadRequest::new("日本語.txt", b"x".to_vec()))
            .await
            .unwrap();
        assert_eq!(cjk.filename, "file.txt");
        assert_eq!(cjk.original_filename, "日本語.txt");

        let accented = f
            .service
            .upload(f.alice, &UploadRequest::new("résumé.pdf", b"y".to_vec()))
            .await
            .unwrap();
        assert_eq!(accented.filename, "resume.pdf");
    }

    #[tokio::test]
    async fn test_upload_skips_name_of_row_missing_on_disk() {
        let f = setup().await;
        let first = f
            .service
            .upload(f.alice, &UploadRequest::new("a.txt", b"one".to_vec()))
            .await
            .unwrap();
        std::fs::remove_file(f.service.storage().user_root(f.alice).join("a.txt")).unwrap();

        let second = f
            .service
            .upload(f.alice, &UploadRequest::new("a.txt", b"two".to_vec()))
            .await
            .unwrap();

        assert_eq!(second.filename, "a_1.txt");
        assert_ne!(second.id, first.id);
        let download = f.service.download(f.alice, second.id).await.unwrap();
        assert_eq!(download.content, b"two");
    }

    #[tokio::test]
    async fn test_download_foreign_file() {
        let f = setup().await;
        let file = f
            .service
            .upload(f.alice, &UploadRequest::new("a.txt", b"secret".to_vec()))
            .await
            .unwrap();

        let result = f.service.download(f.bob, file.id).await;
        assert!(matches!(result, Err(VaultError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_download_missing_on_disk() {
        let f = setup().await;
        let file = f
            .service
            .upload(f.alice, &UploadRequest::new("a.txt", b"x".to_vec()))
            .await
            .unwrap();
        std::fs::remove_file(f.service.storage().user_root(f.alice).join("a.txt")).unwrap();

        let result = f.service.download(f.alice, file.id).await;
        assert!(matches!(result, Err(VaultError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_download_tampered_path() {
        let f = setup().await;
        let file = f
            .service
            .upload(f.alice, &UploadRequest::new("a.txt", b"x".to_vec()))
            .await
            .unwrap();
        sqlx::query("UPDATE files SET file_path = '../user_2/secret.txt' WHERE id = ?")
            .bind(file.id)
            .execute(f.service.db().pool())
            .await
            .unwrap();

        let result = f.service.download(f.alice, file.id).await;
        assert!(matches!(result, Err(VaultError::InvalidPath(_))));
    }

    #[tokio::test]
    async fn test_rename_file() {
        let f = setup().await;
        let file = f
            .service
            .upload(f.alice, &UploadRequest::new("a.txt", b"content".to_vec()))
            .await
            .unwrap();

        let renamed = f
            .service
            .rename_file(f.alice, file.id, "Final Notes.md")
            .await
            .unwrap();

        assert_eq!(renamed.filename, "Final-Notes.md");
        assert_eq!(renamed.original_filename, "Final Notes.md");
        assert_eq!(renamed.file_path, "Final-Notes.md");
        assert_eq!(renamed.mime_type, "text/markdown");

        let root = f.service.storage().user_root(f.alice);
        assert!(!root.join("a.txt").exists());
        let downloaded = f.service.download(f.alice, file.id).await.unwrap();
        assert_eq!(downloaded.content, b"content");
    }

    #[tokio::test]
    async fn test_rename_file_collision() {
        let f = setup().await;
        let a = f
            .service
            .upload(f.alice, &UploadRequest::new("a.txt", b"a".to_vec()))
            .await
            .unwrap();
        f.service
            .upload(f.alice, &UploadRequest::new("b.txt", b"b".to_vec()))
            .await
            .unwrap();

        let result = f.service.rename_file(f.alice, a.id, "b.txt").await;
        assert!(matches!(result, Err(VaultError::AlreadyExists(_))));

        let a = f.service.download(f.alice, a.id).await.unwrap();
        assert_eq!(a.content, b"a");
    }

    #[tokio::test]
    async fn test_rename_file_requires_allowed_extension() {
        let f = setup().await;
        let file = f
            .service
            .upload(f.alice, &UploadRequest::new("a.txt", b"a".to_vec()))
            .await
            .unwrap();

        let result = f.service.rename_file(f.alice, file.id, "a.exe").await;
        assert!(matches!(result, Err(VaultError::UnsupportedType(_))));
    }

    #[tokio::test]
    async fn test_rename_file_missing_on_disk() {
        let f = setup().await;
        let file = f
            .service
            .upload(f.alice, &UploadRequest::new("a.txt", b"a".to_vec()))
            .await
            .unwrap();
        std::fs::remove_file(f.service.storage().user_root(f.alice).join("a.txt")).unwrap();

        let result = f.service.rename_file(f.alice, file.id, "b.txt").await;
        assert!(matches!(result, Err(VaultError::Inconsistent(_))));
    }

    #[tokio::test]
    async fn test_move_file() {
        let f = setup().await;
        let archive = f.service.create_folder(f.alice, "Archive", None).await.unwrap();
        let file = f
            .service
            .upload(f.alice, &UploadRequest::new("a.txt", b"a".to_vec()))
            .await
            .unwrap();

        let moved = f
            .service
            .move_file(f.alice, file.id, Some(archive.id))
            .await
            .unwrap();

        assert_eq!(moved.folder_id, Some(archive.id));
        assert_eq!(moved.file_path, "Archive/a.txt");
        let root = f.service.storage().user_root(f.alice);
        assert!(root.join("Archive").join("a.txt").is_file());
        assert!(!root.join("a.txt").exists());

        let back = f.service.move_file(f.alice, file.id, None).await.unwrap();
        assert_eq!(back.file_path, "a.txt");
        assert!(back.folder_id.is_none());
    }

    #[tokio::test]
    async fn test_move_file_collision() {
        let f = setup().await;
        let archive = f.service.create_folder(f.alice, "Archive", None).await.unwrap();
        let file = f
            .service
            .upload(f.alice, &UploadRequest::new("a.txt", b"root".to_vec()))
            .await
            .unwrap();
        f.service
            .upload(f.alice, &UploadRequest::new("a.txt", b"archived".to_vec()).in_folder(archive.id))
            .await
            .unwrap();

        let result = f.service.move_file(f.alice, file.id, Some(archive.id)).await;
        assert!(matches!(result, Err(VaultError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_move_file_to_foreign_folder() {
        let f = setup().await;
        let bobs = f.service.create_folder(f.bob, "Bob", None).await.unwrap();
        let file = f
            .service
            .upload(f.alice, &UploadRequest::new("a.txt", b"a".to_vec()))
            .await
            .unwrap();

        let result = f.service.move_file(f.alice, file.id, Some(bobs.id)).await;
        assert!(matches!(result, Err(VaultError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_file() {
        let f = setup().await;
        let file = f
            .service
            .upload(f.alice, &UploadRequest::new("a.txt", b"a".to_vec()))
            .await
            .unwrap();

        f.service.delete_file(f.alice, file.id).await.unwrap();

        let root = f.service.storage().user_root(f.alice);
        assert!(!root.join("a.txt").exists());
        let again = f.service.delete_file(f.alice, file.id).await;
        assert!(matches!(again, Err(VaultError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_file_missing_on_disk_is_ok() {
        let f = setup().await;
        let file = f
            .service
            .upload(f.alice, &UploadRequest::new("a.txt", b"a".to_vec()))
            .await
            .unwrap();
        std::fs::remove_file(f.service.storage().user_root(f.alice).join("a.txt")).unwrap();

        f.service.delete_file(f.alice, file.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_foreign_file() {
        let f = setup().await;
        let file = f
            .service
            .upload(f.alice, &UploadRequest::new("a.txt", b"a".to_vec()))
            .await
            .unwrap();

        let result = f.service.delete_file(f.bob, file.id).await;
        assert!(matches!(result, Err(VaultError::NotFound(_))));
        assert!(f.service.download(f.alice, file.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_folder() {
        let f = setup().await;

        let projects = f
            .service
            .create_folder(f.alice, "My Projects", None)
            .await
            .unwrap();
        let year = f
            .service
            .create_folder(f.alice, "2024", Some(projects.id))
            .await
            .unwrap();

        assert_eq!(projects.name, "My-Projects");
        assert_eq!(year.path, "My-Projects/2024");
        let root = f.service.storage().user_root(f.alice);
        assert!(root.join("My-Projects").join("2024").is_dir());
    }

    #[tokio::test]
    async fn test_create_folder_collision() {
        let f = setup().await;
        f.service.create_folder(f.alice, "Docs", None).await.unwrap();

        let result = f.service.create_folder(f.alice, "Docs", None).await;
        assert!(matches!(result, Err(VaultError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_create_folder_over_existing_file() {
        let f = setup().await;
        f.service
            .upload(f.alice, &UploadRequest::new("notes.txt", b"x".to_vec()))
            .await
            .unwrap();

        let result = f.service.create_folder(f.alice, "notes.txt", None).await;
        assert!(matches!(result, Err(VaultError::AlreadyExists(_))));
        assert!(f.service.storage().user_root(f.alice).join("notes.txt").is_file());
    }

    #[tokio::test]
    async fn test_create_folder_bad_parent() {
        let f = setup().await;
        let alices = f.service.create_folder(f.alice, "Docs", None).await.unwrap();

        let missing = f.service.create_folder(f.alice, "X", Some(9999)).await;
        assert!(matches!(missing, Err(VaultError::NotFound(_))));

        let foreign = f.service.create_folder(f.bob, "X", Some(alices.id)).await;
        assert!(matches!(foreign, Err(VaultError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_folder_traversal_name() {
        let f = setup().await;

        let folder = f.service.create_folder(f.alice, "../../etc", None).await.unwrap();
        assert_eq!(folder.name, "etc");
        assert!(f.service.storage().user_root(f.alice).join("etc").is_dir());

        let result = f.service.create_folder(f.alice, "..", None).await;
        assert!(matches!(result, Err(VaultError::InvalidName(_))));
    }

    #[tokio::test]
    async fn test_rename_folder() {
        let f = setup().await;
        let docs = f.service.create_folder(f.alice, "Docs", None).await.unwrap();
        let sub = f.service.create_folder(f.alice, "Sub", Some(docs.id)).await.unwrap();
        let file = f
            .service
            .upload(f.alice, &UploadRequest::new("a.txt", b"deep".to_vec()).in_folder(sub.id))
            .await
            .unwrap();

        let renamed = f.service.rename_folder(f.alice, docs.id, "Papers").await.unwrap();
        assert_eq!(renamed.path, "Papers");

        let root = f.service.storage().user_root(f.alice);
        assert!(root.join("Papers").join("Sub").join("a.txt").is_file());
        assert!(!root.join("Docs").exists());

        let downloaded = f.service.download(f.alice, file.id).await.unwrap();
        assert_eq!(downloaded.file.file_path, "Papers/Sub/a.txt");
        assert_eq!(downloaded.content, b"deep");
    }

    #[tokio::test]
    async fn test_rename_folder_collision() {
        let f = setup().await;
        let docs = f.service.create_folder(f.alice, "Docs", None).await.unwrap();
        f.service.create_folder(f.alice, "Taken", None).await.unwrap();

        let result = f.service.rename_folder(f.alice, docs.id, "Taken").await;
        assert!(matches!(result, Err(VaultError::AlreadyExists(_))));
        assert!(f.service.storage().user_root(f.alice).join("Docs").is_dir());
    }

    #[tokio::test]
    async fn test_delete_folder() {
        let f = setup().await;
        let docs = f.service.create_folder(f.alice, "Docs", None).await.unwrap();
        let sub = f.service.create_folder(f.alice, "Sub", Some(docs.id)).await.unwrap();
        let file = f
            .service
            .upload(f.alice, &UploadRequest::new("a.txt", b"x".to_vec()).in_folder(sub.id))
            .await
            .unwrap();

        f.service.delete_folder(f.alice, docs.id).await.unwrap();

        assert!(!f.service.storage().user_root(f.alice).join("Docs").exists());
        assert!(matches!(
            f.service.download(f.alice, file.id).await,
            Err(VaultError::NotFound(_))
        ));
        let folders = FolderRepository::new(f.service.db().pool());
        assert!(folders.get(f.alice, sub.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_foreign_folder() {
        let f = setup().await;
        let docs = f.service.create_folder(f.alice, "Docs", None).await.unwrap();

        let result = f.service.delete_folder(f.bob, docs.id).await;
        assert!(matches!(result, Err(VaultError::NotFound(_))));
        assert!(f.service.storage().user_root(f.alice).join("Docs").is_dir());
    }

    #[tokio::test]
    async fn test_purge_user() {
        let f = setup().await;
        f.service.create_folder(f.alice, "Docs", None).await.unwrap();
        f.service
            .upload(f.alice, &UploadRequest::new("a.txt", b"x".to_vec()))
            .await
            .unwrap();
        let bobs = f
            .service
            .upload(f.bob, &UploadRequest::new("b.txt", b"y".to_vec()))
            .await
            .unwrap();

        assert!(f.service.purge_user(f.alice).await.unwrap());

        assert!(!f.service.storage().user_root(f.alice).exists());
        let users = UserRepository::new(f.service.db().pool());
        assert!(users.get_by_id(f.alice).await.unwrap().is_none());
        assert!(f.service.download(f.bob, bobs.id).await.is_ok());

        assert!(!f.service.purge_user(f.alice).await.unwrap());
    }
}
