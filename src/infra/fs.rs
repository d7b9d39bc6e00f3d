//! Reading note files and enumerating a notes directory.

use crate::infra::content_hash::ContentHash;
use crate::infra::frontmatter::{ParseError, ParsedNote, parse_with_hash};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Debug, Error)]
pub enum FsError {
    #[error("note file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("invalid encoding in {path}: {detail}")]
    InvalidEncoding { path: PathBuf, detail: String },
}

impl FsError {
    fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => FsError::NotFound { path: path.into() },
            io::ErrorKind::PermissionDenied => FsError::PermissionDenied { path: path.into() },
            _ => FsError::Io {
                path: path.into(),
                source: error,
            },
        }
    }

    fn encoding(path: &Path, detail: impl Into<String>) -> Self {
        FsError::InvalidEncoding {
            path: path.into(),
            detail: detail.into(),
        }
    }
}

/// Reads the raw bytes of a file.
pub fn read_bytes(path: &Path) -> Result<Vec<u8>, FsError> {
    std::fs::read(path).map_err(|e| FsError::from_io(path, e))
}

/// Reads, hashes and parses a note file in one pass.
pub fn read_note(path: &Path) -> Result<ParsedNote, FsError> {
    parse_note_from_bytes(read_bytes(path)?, path)
}

/// Parses bytes that were already read from `path`.
///
/// The hash is taken over `bytes` as given. Then:
/// - UTF-16 byte order marks are rejected
/// - invalid UTF-8 is rejected
/// - a UTF-8 BOM is stripped
/// - any CR not followed by LF is rejected
pub fn parse_note_from_bytes(bytes: Vec<u8>, path: &Path) -> Result<ParsedNote, FsError> {
    let content_hash = ContentHash::compute(&bytes);

    if bytes.starts_with(&[0xFF, 0xFE]) {
        return Err(FsError::encoding(path, "UTF-16 LE byte order mark; convert to UTF-8"));
    }
    if bytes.starts_with(&[0xFE, 0xFF]) {
        return Err(FsError::encoding(path, "UTF-16 BE byte order mark; convert to UTF-8"));
    }

    let content = String::from_utf8(bytes).map_err(|e| {
        FsError::encoding(
            path,
            format!("invalid UTF-8 at byte {}", e.utf8_error().valid_up_to()),
        )
    })?;
    let content = content.strip_prefix('\u{FEFF}').unwrap_or(&content);

    let raw = content.as_bytes();
    let lone_cr = raw
        .iter()
        .enumerate()
        .any(|(i, &b)| b == b'\r' && raw.get(i + 1) != Some(&b'\n'));
    if lone_cr {
        return Err(FsError::encoding(
            path,
            "CR-only line endings; convert to LF or CRLF",
        ));
    }

    parse_with_hash(content, content_hash).map_err(|source| FsError::Parse {
        path: path.into(),
        source,
    })
}

/// Lists markdown files under `dir`, relative to it, in sorted order.
///
/// Hidden files and directories are skipped, which keeps the store under
/// `.index/` out of the scan. Unreadable entries are logged and skipped.
pub fn scan_notes_directory(dir: &Path) -> Result<Vec<PathBuf>, FsError> {
    let meta = std::fs::metadata(dir).map_err(|e| FsError::from_io(dir, e))?;
    if !meta.is_dir() {
        return Err(FsError::NotADirectory { path: dir.into() });
    }

    let paths = WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                log::warn!("skipping unreadable entry under {}: {}", dir.display(), err);
                None
            }
        })
        .filter(|e| e.file_type().is_file() && has_md_extension(e))
        .filter_map(|e| e.path().strip_prefix(dir).ok().map(Path::to_path_buf))
        .collect();

    Ok(paths)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|s| s.starts_with('.'))
}

fn has_md_extension(entry: &DirEntry) -> bool {
    entry.path().extension().is_some_and(|e| e == "md")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    const FRONTMATTER: &str = "---\nid: 01HQ3K5M7NXJK4QZPW8V2R6T9Y\ntitle: Test\n\
                               created: 2024-01-15T10:30:00Z\nmodified: 2024-01-15T10:30:00Z\n---\n";

    fn write(dir: &TempDir, rel: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn reads_valid_note() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "note.md", format!("{FRONTMATTER}Body\n").as_bytes());

        let parsed = read_note(&path).unwrap();
        assert_eq!(parsed.note.title(), "Test");
        assert_eq!(parsed.body, "Body\n");
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = read_note(&dir.path().join("nope.md")).unwrap_err();
        assert!(matches!(err, FsError::NotFound { .. }));
    }

    #[test]
    fn parse_error_carries_path() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "bad.md", b"no frontmatter");
        let err = read_note(&path).unwrap_err();
        assert!(matches!(err, FsError::Parse { .. }));
        assert!(err.to_string().contains("bad.md"));
    }

    #[test]
    fn utf8_bom_is_stripped_but_hashed() {
        let dir = TempDir::new().unwrap();
        let plain = write(&dir, "a.md", FRONTMATTER.as_bytes());
        let mut with_bom = vec![0xEF, 0xBB, 0xBF];
        with_bom.extend_from_slice(FRONTMATTER.as_bytes());
        let bom = write(&dir, "b.md", &with_bom);

        let a = read_note(&plain).unwrap();
        let b = read_note(&bom).unwrap();
        assert_eq!(b.note.title(), "Test");
        assert_ne!(a.content_hash, b.content_hash);
        assert_eq!(b.content_hash, ContentHash::compute(&with_bom));
    }

    #[test]
    fn rejects_utf16_boms() {
        let dir = TempDir::new().unwrap();
        for (name, bom) in [("le.md", [0xFF, 0xFE]), ("be.md", [0xFE, 0xFF])] {
            let mut bytes = bom.to_vec();
            bytes.extend_from_slice(b"---\n");
            let err = read_note(&write(&dir, name, &bytes)).unwrap_err();
            assert!(err.to_string().contains("UTF-16"), "{err}");
        }
    }

    #[test]
    fn rejects_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let mut bytes = FRONTMATTER.as_bytes().to_vec();
        bytes.extend_from_slice(&[0xC3, 0x28]);
        let err = read_note(&write(&dir, "x.md", &bytes)).unwrap_err();
        assert!(matches!(err, FsError::InvalidEncoding { .. }));
    }

    #[test]
    fn rejects_lone_cr_even_when_mixed_with_crlf() {
        let dir = TempDir::new().unwrap();
        let content = format!("{FRONTMATTER}line one\r\nline two\rline three\n");
        let err = read_note(&write(&dir, "cr.md", content.as_bytes())).unwrap_err();
        assert!(err.to_string().contains("CR-only"));

        let trailing = format!("{FRONTMATTER}end\r");
        assert!(read_note(&write(&dir, "cr2.md", trailing.as_bytes())).is_err());
    }

    #[test]
    fn accepts_crlf_body() {
        let dir = TempDir::new().unwrap();
        let content = format!("{FRONTMATTER}one\r\ntwo\r\n");
        let parsed = read_note(&write(&dir, "crlf.md", content.as_bytes())).unwrap();
        assert_eq!(parsed.body, "one\r\ntwo\r\n");
    }

    #[test]
    fn scan_is_sorted_relative_and_skips_hidden() {
        let dir = TempDir::new().unwrap();
        write(&dir, "b.md", b"");
        write(&dir, "a.md", b"");
        write(&dir, "sub/c.md", b"");
        write(&dir, "notes.txt", b"");
        write(&dir, ".hidden.md", b"");
        write(&dir, ".index/notes.md", b"");
        write(&dir, ".git/x/y.md", b"");
        fs::create_dir_all(dir.path().join("folder.md")).unwrap();

        let paths = scan_notes_directory(dir.path()).unwrap();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("a.md"),
                PathBuf::from("b.md"),
                PathBuf::from("sub/c.md"),
            ]
        );
    }

    #[test]
    fn scan_of_empty_directory() {
        let dir = TempDir::new().unwrap();
        assert!(scan_notes_directory(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn scan_rejects_missing_and_non_directory_roots() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            scan_notes_directory(&dir.path().join("missing")),
            Err(FsError::NotFound { .. })
        ));
        let file = write(&dir, "file.md", b"");
        assert!(matches!(
            scan_notes_directory(&file),
            Err(FsError::NotADirectory { .. })
        ));
    }
}
