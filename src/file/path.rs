//! Sandboxed path resolution.
//!
//! Every physical path the storage engine touches is derived from a user's
//! storage root plus a relative, `/`-separated path taken from metadata.
//! [`resolve`] is the only way such a path is produced.

use std::io;
use std::path::{Path, PathBuf};

use crate::{Result, VaultError};

/// Resolve `relative` against `root`, refusing anything outside the root.
///
/// The relative path is normalized lexically (`.`, `..`, empty segments and
/// `\` separators). Absolute paths, drive prefixes and NUL bytes are rejected.
/// If part of the target already exists on disk, that part is canonicalized
/// and must still lie under the canonicalized root, which catches symbolic
/// links pointing elsewhere.
pub fn resolve(root: &Path, relative: &str) -> Result<PathBuf> {
    let segments = normalize(relative)?;

    let mut target = root.to_path_buf();
    for segment in &segments {
        target.push(segment);
    }

    check_existing_prefix(root, &target, relative)?;
    Ok(target)
}

/// Lexically normalize a relative path into its segments.
fn normalize(relative: &str) -> Result<Vec<&str>> {
    let invalid = || VaultError::InvalidPath(relative.to_string());

    if relative.contains('\0') {
        return Err(invalid());
    }
    if relative.starts_with('/') || relative.starts_with('\\') || has_drive_prefix(relative) {
        return Err(invalid());
    }

    let mut segments: Vec<&str> = Vec::new();
    for part in relative.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(invalid());
                }
            }
            other => segments.push(other),
        }
    }
    Ok(segments)
}

fn has_drive_prefix(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Canonicalize the deepest existing ancestor of `target` and make sure it
/// is still inside the canonical root.
fn check_existing_prefix(root: &Path, target: &Path, relative: &str) -> Result<()> {
    let canonical_root = match root.canonicalize() {
        Ok(path) => path,
        // Nothing below a missing root exists either.
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    let mut probe = target;
    loop {
        // symlink_metadata so that a dangling link still counts as present
        if probe.symlink_metadata().is_ok() {
            break;
        }
        match probe.parent() {
            Some(parent) => probe = parent,
            None => return Ok(()),
        }
    }

    let canonical = probe
        .canonicalize()
        .map_err(|_| VaultError::InvalidPath(relative.to_string()))?;
    if canonical.starts_with(&canonical_root) {
        Ok(())
    } else {
        Err(VaultError::InvalidPath(relative.to_string()))
    }
}

/// Join a directory path and a name into a `/`-separated relative path.
pub fn join_relative(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// Directory part of a relative path (empty for root-level entries).
pub fn parent_of(relative: &str) -> &str {
    match relative.rsplit_once('/') {
        Some((dir, _)) => dir,
        None => "",
    }
}

/// Replace the leading `old_prefix` of `path` with `new_prefix`.
///
/// Only whole segments match: `Docs` is a prefix of `Docs/a` but not of
/// `Docs2/a`. Returns `None` when `path` is not under `old_prefix`.
pub fn rebase(path: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
    if path == old_prefix {
        return Some(new_prefix.to_string());
    }
    let rest = path.strip_prefix(old_prefix)?.strip_prefix('/')?;
    Some(join_relative(new_prefix, rest))
}
