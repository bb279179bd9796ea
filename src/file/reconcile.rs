//! Detect-only comparison of metadata with a user's storage root.
//!
//! Every row's physical location is `root(user) / path`, so the scan can
//! tell exactly which side is missing. Nothing is modified.

use std::collections::HashSet;
use std::io;
use std::path::Path;

use tokio::fs;
use tracing::warn;

use crate::db::Database;
use crate::{Result, VaultError};

use super::folder::FolderRepository;
use super::metadata::FileRepository;
use super::storage::FileStorage;

/// Differences found between metadata and disk for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Files whose row exists but whose content is missing (id, path).
    pub missing_files: Vec<(i64, String)>,
    /// Folders whose row exists but whose directory is missing (id, path).
    pub missing_folders: Vec<(i64, String)>,
    /// Regular files on disk with no row, relative to the user's root.
    pub orphan_files: Vec<String>,
    /// File rows whose stored path does not resolve inside the root (id, path).
    pub invalid_file_paths: Vec<(i64, String)>,
    /// Folder rows whose stored path does not resolve inside the root (id, path).
    pub invalid_folder_paths: Vec<(i64, String)>,
}

impl ReconcileReport {
    /// Whether metadata and disk agree.
    pub fn is_clean(&self) -> bool {
        self.missing_files.is_empty()
            && self.missing_folders.is_empty()
            && self.orphan_files.is_empty()
            && self.invalid_file_paths.is_empty()
            && self.invalid_folder_paths.is_empty()
    }
}

/// Compare a user's rows with the contents of their storage root.
pub async fn scan_user(db: &Database, storage: &FileStorage, user_id: i64) -> Result<ReconcileReport> {
    let mut report = ReconcileReport::default();

    let folders = FolderRepository::new(db.pool()).list_all(user_id).await?;
    for folder in folders {
        let dir = match storage.resolve(user_id, &folder.path) {
            Ok(dir) => dir,
            Err(VaultError::InvalidPath(_)) => {
                warn!(user_id, folder_id = folder.id, path = %folder.path, "Folder row has an invalid path");
                report.invalid_folder_paths.push((folder.id, folder.path));
                continue;
            }
            Err(e) => return Err(e),
        };
        if !fs::metadata(&dir).await.map(|m| m.is_dir()).unwrap_or(false) {
            report.missing_folders.push((folder.id, folder.path));
        }
    }

    let files = FileRepository::new(db.pool()).list_all(user_id).await?;
    let mut known: HashSet<String> = HashSet::with_capacity(files.len());
    for file in files {
        let target = match storage.resolve(user_id, &file.file_path) {
            Ok(target) => target,
            Err(VaultError::InvalidPath(_)) => {
                warn!(user_id, file_id = file.id, path = %file.file_path, "File row has an invalid path");
                report.invalid_file_paths.push((file.id, file.file_path));
                continue;
            }
            Err(e) => return Err(e),
        };
        if !fs::metadata(&target).await.map(|m| m.is_file()).unwrap_or(false) {
            report.missing_files.push((file.id, file.file_path.clone()));
        }
        known.insert(file.file_path);
    }

    let mut on_disk = Vec::new();
    collect_files(&storage.user_root(user_id), &mut on_disk).await?;
    on_disk.sort();
    report.orphan_files = on_disk
        .into_iter()
        .filter(|path| !known.contains(path))
        .collect();

    Ok(report)
}

/// Walk `root` iteratively, pushing `/`-separated relative paths of regular files.
async fn collect_files(root: &Path, out: &mut Vec<String>) -> Result<()> {
    let mut pending = vec![String::new()];

    while let Some(rel) = pending.pop() {
        let dir = if rel.is_empty() {
            root.to_path_buf()
        } else {
            root.join(&rel)
        };
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let child = super::path::join_relative(&rel, &name);
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push(child);
            } else if file_type.is_file() {
                out.push(child);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewUser, UserRepository};
    use crate::file::{FileService, UploadRequest};
    use tempfile::TempDir;

    async fn setup() -> (TempDir, FileService, i64) {
        let dir = TempDir::new().unwrap();
        let db = Database::open_in_memory().await.unwrap();
        let alice = UserRepository::new(db.pool())
            .create(&NewUser::new("alice", "alice@example.com", "pw"))
            .await
            .unwrap()
            .id;
        let storage = FileStorage::new(dir.path()).unwrap();
        let service = FileService::new(db, storage, vec!["txt".to_string()]);
        (dir, service, alice)
    }

    #[tokio::test]
    async fn test_clean_after_normal_operations() {
        let (_dir, service, alice) = setup().await;
        let docs = service.create_folder(alice, "Docs", None).await.unwrap();
        service
            .upload(alice, &UploadRequest::new("a.txt", b"a".to_vec()).in_folder(docs.id))
            .await
            .unwrap();

        let report = service.scan_user(alice).await.unwrap();
        assert!(report.is_clean(), "{report:?}");
    }

    #[tokio::test]
    async fn test_empty_user() {
        let (_dir, service, alice) = setup().await;
        let report = scan_user(service.db(), service.storage(), alice).await.unwrap();
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn test_detects_each_kind_of_drift() {
        let (_dir, service, alice) = setup().await;
        let docs = service.create_folder(alice, "Docs", None).await.unwrap();
        let gone = service.create_folder(alice, "Gone", None).await.unwrap();
        let file = service
            .upload(alice, &UploadRequest::new("a.txt", b"a".to_vec()).in_folder(docs.id))
            .await
            .unwrap();

        let root = service.storage().user_root(alice);
        std::fs::remove_file(root.join("Docs").join("a.txt")).unwrap();
        std::fs::remove_dir(root.join("Gone")).unwrap();
        std::fs::write(root.join("Docs").join("stray.txt"), b"?").unwrap();

        let report = service.scan_user(alice).await.unwrap();

        assert_eq!(report.missing_files, vec![(file.id, "Docs/a.txt".to_string())]);
        assert_eq!(report.missing_folders, vec![(gone.id, "Gone".to_string())]);
        assert_eq!(report.orphan_files, vec!["Docs/stray.txt".to_string()]);

        // Detect-only: nothing was repaired
        assert!(root.join("Docs").join("stray.txt").exists());
    }

    #[tokio::test]
    async fn test_reports_rows_with_escaping_paths() {
        let (_dir, service, alice) = setup().await;
        let docs = service.create_folder(alice, "Docs", None).await.unwrap();
        let file = service
            .upload(alice, &UploadRequest::new("a.txt", b"a".to_vec()))
            .await
            .unwrap();
        sqlx::query("UPDATE files SET file_path = '../user_999/a.txt' WHERE id = ?")
            .bind(file.id)
            .execute(service.db().pool())
            .await
            .unwrap();
        sqlx::query("UPDATE folders SET path = '/etc' WHERE id = ?")
            .bind(docs.id)
            .execute(service.db().pool())
            .await
            .unwrap();

        let report = service.scan_user(alice).await.unwrap();

        assert_eq!(
            report.invalid_file_paths,
            vec![(file.id, "../user_999/a.txt".to_string())]
        );
        assert_eq!(report.invalid_folder_paths, vec![(docs.id, "/etc".to_string())]);
        assert_eq!(report.orphan_files, vec!["a.txt".to_string()]);
        assert!(report.missing_files.is_empty());
        assert!(!report.is_clean());
    }
}
