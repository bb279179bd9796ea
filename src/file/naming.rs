//! Naming policy for stored files and folders.
//!
//! User-supplied names are turned into filesystem-safe names with
//! [`sanitize`], and collisions inside a directory are resolved with
//! [`disambiguate`] by appending `_1`, `_2`, ... before the extension.

use std::collections::HashSet;
use std::io;
use std::path::Path;

use unicode_normalization::UnicodeNormalization;

use crate::{Result, VaultError};

use super::MAX_NAME_LENGTH;

/// Stem used when a name's stem sanitizes away but its extension survives.
const FALLBACK_STEM: &str = "file";

/// Sanitize a user-supplied name into a safe single path segment.
///
/// The name is NFKD-folded so accented letters keep their base letter.
/// Path separators become spaces, only ASCII word characters, whitespace,
/// hyphens and dots are kept, whitespace/hyphen runs collapse into a single
/// `-`, and leading or trailing `.`, `-`, `_` are trimmed. The result can
/// therefore never be `.`, `..` or a hidden name. A stem with nothing
/// ASCII left in it (`日本語.txt`) becomes `file.txt`.
pub fn sanitize(raw: &str) -> Result<String> {
    let folded = fold(raw);
    let mut name = trim_edges(&folded).to_string();

    if let Some((stem, ext)) = raw.rsplit_once('.') {
        let ext = fold(ext);
        let ext = trim_edges(&ext);
        if !ext.is_empty() && stem.chars().any(is_stem_char) && trim_edges(&fold(stem)).is_empty()
        {
            name = format!("{FALLBACK_STEM}.{ext}");
        }
    }

    if name.is_empty() {
        return Err(VaultError::InvalidName(raw.to_string()));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(VaultError::InvalidName(format!(
            "name longer than {MAX_NAME_LENGTH} bytes"
        )));
    }
    Ok(name)
}

fn fold(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_dash = false;

    for c in raw.nfkd() {
        let c = if c == '/' || c == '\\' { ' ' } else { c };
        if c.is_whitespace() || c == '-' {
            pending_dash = true;
            continue;
        }
        if !(c.is_ascii_alphanumeric() || c == '_' || c == '.') {
            continue;
        }
        if pending_dash {
            out.push('-');
            pending_dash = false;
        }
        out.push(c);
    }
    out
}

fn trim_edges(s: &str) -> &str {
    s.trim_matches(|c| c == '.' || c == '-' || c == '_')
}

fn is_stem_char(c: char) -> bool {
    !(c.is_whitespace() || matches!(c, '.' | '-' | '_' | '/' | '\\'))
}

/// Split a name into stem and extension (`"a.tar.gz"` -> `("a.tar", ".gz")`).
///
/// A leading dot does not start an extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], &name[idx..]),
        _ => (name, ""),
    }
}

/// Lowercased extension of `name` without the dot, if any.
pub fn extension_of(name: &str) -> Option<String> {
    let (_, ext) = split_extension(name);
    ext.strip_prefix('.')
        .filter(|e| !e.is_empty())
        .map(|e| e.to_ascii_lowercase())
}

/// Case-insensitive check of the extension against the allow-list.
pub fn is_allowed_extension(name: &str, allowed: &[String]) -> bool {
    match extension_of(name) {
        Some(ext) => allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext)),
        None => false,
    }
}

/// Best-effort MIME type from the name, `application/octet-stream` otherwise.
pub fn mime_type(name: &str) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

async fn entry_exists(path: &Path) -> bool {
    tokio::fs::symlink_metadata(path).await.is_ok()
}

/// Pick a name that does not exist yet in `dir` and is not in `taken`.
///
/// `taken` holds names that metadata already claims in that directory,
/// whether or not their content is still on disk. Returns `desired` when
/// free, otherwise the first free `stem_N.ext`. At most
/// `entries + taken + 1` candidates are tried, so the search always ends.
pub async fn disambiguate(dir: &Path, desired: &str, taken: &HashSet<String>) -> Result<String> {
    let is_free = |name: &str| {
        let claimed = taken.contains(name);
        let path = dir.join(name);
        async move { !claimed && !entry_exists(&path).await }
    };

    if is_free(desired).await {
        return Ok(desired.to_string());
    }

    let entries = count_entries(dir).await?;
    let (stem, ext) = split_extension(desired);

    for n in 1..=entries + taken.len() + 1 {
        let candidate = format!("{stem}_{n}{ext}");
        if is_free(&candidate).await {
            return Ok(candidate);
        }
    }

    Err(VaultError::AlreadyExists(desired.to_string()))
}

async fn count_entries(dir: &Path) -> Result<usize> {
    let mut read_dir = match tokio::fs::read_dir(dir).await {
        Ok(rd) => rd,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };
    let mut count = 0;
    while read_dir.next_entry().await?.is_some() {
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_plain() {
        assert_eq!(sanitize("report.pdf").unwrap(), "report.pdf");
        assert_eq!(sanitize("my_notes-v2.txt").unwrap(), "my_notes-v2.txt");
    }

    #[test]
    fn test_sanitize_whitespace_and_hyphens() {
        assert_eq!(sanitize("my report.pdf").unwrap(), "my-report.pdf");
        assert_eq!(sanitize("a  -  b.txt").unwrap(), "a-b.txt");
        assert_eq!(sanitize("tab\there.md").unwrap(), "tab-here.md");
    }

    #[test]
    fn test_sanitize_separators() {
        assert_eq!(sanitize("../../etc/passwd").unwrap(), "etc-passwd");
        assert_eq!(sanitize("C:\\Users\\x.txt").unwrap(), "C-Users-x.txt");
    }

    #[test]
    fn test_sanitize_drops_special_chars() {
        assert_eq!(sanitize("inv<o>ice?*.pdf").unwrap(), "invoice.pdf");
    }

    #[test]
    fn test_sanitize_folds_unicode() {
        assert_eq!(sanitize("résumé.doc").unwrap(), "resume.doc");
        assert_eq!(sanitize("Ｒｅｐｏｒｔ.pdf").unwrap(), "Report.pdf");
        assert_eq!(sanitize("naïve café.txt").unwrap(), "naive-cafe.txt");
    }

    #[test]
    fn test_sanitize_keeps_extension_when_stem_vanishes() {
        assert_eq!(sanitize("日本語.txt").unwrap(), "file.txt");
        assert_eq!(sanitize("***.pdf").unwrap(), "file.pdf");
        assert_eq!(sanitize(".hidden").unwrap(), "hidden");
        assert!(matches!(sanitize("日本語"), Err(VaultError::InvalidName(_))));
    }

    #[test]
    fn test_sanitize_trims_edges() {
        assert_eq!(sanitize(".hidden").unwrap(), "hidden");
        assert_eq!(sanitize("__init__.py").unwrap(), "init__.py");
        assert_eq!(sanitize("-dash-").unwrap(), "dash");
        assert_eq!(sanitize("name.").unwrap(), "name");
    }

    #[test]
    fn test_sanitize_never_dot_names() {
        for raw in [".", "..", "...", " . ", "./..", "---", "_"] {
            assert!(
                matches!(sanitize(raw), Err(VaultError::InvalidName(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_sanitize_empty() {
        assert!(matches!(sanitize(""), Err(VaultError::InvalidName(_))));
        assert!(matches!(sanitize("***"), Err(VaultError::InvalidName(_))));
    }

    #[test]
    fn test_sanitize_too_long() {
        let long = format!("{}.txt", "a".repeat(300));
        assert!(matches!(sanitize(&long), Err(VaultError::InvalidName(_))));

        let fits = format!("{}.txt", "a".repeat(251));
        assert_eq!(sanitize(&fits).unwrap().len(), 255);
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("a.PDF").as_deref(), Some("pdf"));
        assert_eq!(extension_of("a.tar.gz").as_deref(), Some("gz"));
        assert_eq!(extension_of("README"), None);
        assert_eq!(extension_of(".bashrc"), None);
        assert_eq!(extension_of("trailing."), None);
    }

    #[test]
    fn test_is_allowed_extension() {
        let allowed = vec!["pdf".to_string(), "txt".to_string()];

        assert!(is_allowed_extension("report.pdf", &allowed));
        assert!(is_allowed_extension("REPORT.PDF", &allowed));
        assert!(!is_allowed_extension("setup.exe", &allowed));
        assert!(!is_allowed_extension("pdf", &allowed));
        assert!(!is_allowed_extension("report.pdf.exe", &allowed));
    }

    #[test]
    fn test_mime_type() {
        assert_eq!(mime_type("report.pdf"), "application/pdf");
        assert_eq!(mime_type("photo.PNG"), "image/png");
        assert_eq!(mime_type("notes.txt"), "text/plain");
        assert_eq!(mime_type("blob.unknownext"), "application/octet-stream");
        assert_eq!(mime_type("noext"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_disambiguate_free_name() {
        let dir = TempDir::new().unwrap();
        let name = disambiguate(dir.path(), "a.txt", &HashSet::new()).await.unwrap();
        assert_eq!(name, "a.txt");
    }

    #[tokio::test]
    async fn test_disambiguate_appends_counter() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"1").unwrap();

        assert_eq!(disambiguate(dir.path(), "a.txt", &HashSet::new()).await.unwrap(), "a_1.txt");

        std::fs::write(dir.path().join("a_1.txt"), b"2").unwrap();
        assert_eq!(disambiguate(dir.path(), "a.txt", &HashSet::new()).await.unwrap(), "a_2.txt");
    }

    #[tokio::test]
    async fn test_disambiguate_multi_dot_and_no_extension() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("backup.tar.gz"), b"").unwrap();
        std::fs::write(dir.path().join("README"), b"").unwrap();

        assert_eq!(
            disambiguate(dir.path(), "backup.tar.gz", &HashSet::new()).await.unwrap(),
            "backup.tar_1.gz"
        );
        assert_eq!(disambiguate(dir.path(), "README", &HashSet::new()).await.unwrap(), "README_1");
    }

    #[tokio::test]
    async fn test_disambiguate_counts_directories() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("Docs")).unwrap();

        assert_eq!(disambiguate(dir.path(), "Docs", &HashSet::new()).await.unwrap(), "Docs_1");
    }

    #[tokio::test]
    async fn test_disambiguate_skips_names_claimed_by_metadata() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a_1.txt"), b"").unwrap();
        let taken: HashSet<String> = ["a.txt".to_string()].into_iter().collect();

        assert_eq!(disambiguate(dir.path(), "a.txt", &taken).await.unwrap(), "a_2.txt");
        assert_eq!(disambiguate(dir.path(), "b.txt", &taken).await.unwrap(), "b.txt");
    }

    #[tokio::test]
    async fn test_disambiguate_missing_dir() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(disambiguate(&missing, "a.txt", &HashSet::new()).await.unwrap(), "a.txt");
    }
}
