//! Database schema and migrations for FileVault.
//!
//! This module contains all database migrations that will be applied
//! sequentially when the database is first opened or upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: Users table
    r#"
CREATE TABLE users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL UNIQUE,
    email       TEXT NOT NULL UNIQUE,
    password    TEXT NOT NULL,           -- Argon2 hash
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);
"#,
    // v2: Folder tree, one row per folder with a materialized path
    r#"
CREATE TABLE folders (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name        TEXT NOT NULL,
    parent_id   INTEGER REFERENCES folders(id) ON DELETE CASCADE,  -- NULL for root-level
    path        TEXT NOT NULL,           -- e.g. 'Projects/2024'
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (user_id, path)
);

CREATE INDEX idx_folders_user_parent ON folders(user_id, parent_id);
"#,
    // v3: Files, leaves of the folder tree
    r#"
CREATE TABLE files (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id             INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    folder_id           INTEGER REFERENCES folders(id) ON DELETE CASCADE,  -- NULL for user root
    filename            TEXT NOT NULL,   -- stored (sanitized, collision-free) name
    original_filename   TEXT NOT NULL,   -- display name
    file_path           TEXT NOT NULL,   -- relative to the user's storage root
    file_size           INTEGER NOT NULL DEFAULT 0,
    mime_type           TEXT NOT NULL DEFAULT 'application/octet-stream',
    created_at          TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at          TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_files_user_folder ON files(user_id, folder_id);
CREATE UNIQUE INDEX idx_files_user_path ON files(user_id, file_path);
"#,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_not_empty() {
        assert!(!MIGRATIONS.is_empty());
    }

    #[test]
    fn test_migrations_create_core_tables() {
        let all = MIGRATIONS.concat();
        assert!(all.contains("CREATE TABLE users"));
        assert!(all.contains("CREATE TABLE folders"));
        assert!(all.contains("CREATE TABLE files"));
    }

    #[test]
    fn test_children_cascade_with_parents() {
        let all = MIGRATIONS.concat();
        assert!(all.contains("REFERENCES folders(id) ON DELETE CASCADE"));
        assert!(all.contains("REFERENCES users(id) ON DELETE CASCADE"));
    }
}
