//! Builds and refreshes the index from the markdown files on disk.

use crate::domain::NoteId;
use crate::index::{IndexError, IndexResult, NoteRecord, SqliteIndex};
use crate::infra::{
    ContentHash, FsError, ParsedNote, parse_note_from_bytes, read_bytes, read_note,
    scan_notes_directory,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A file that could not be indexed. The pass records it and moves on.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuildError {
    #[error("{}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("{}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("{}: {message}", path.display())]
    Encoding { path: PathBuf, message: String },

    #[error("{}: duplicate id {id} (already indexed from {})", path.display(), first_path.display())]
    DuplicateId {
        path: PathBuf,
        id: NoteId,
        first_path: PathBuf,
    },
}

impl BuildError {
    pub fn path(&self) -> &Path {
        match self {
            BuildError::Parse { path, .. }
            | BuildError::Io { path, .. }
            | BuildError::Encoding { path, .. }
            | BuildError::DuplicateId { path, .. } => path,
        }
    }

    fn from_fs(error: FsError, path: &Path) -> Self {
        let path = path.to_path_buf();
        match error {
            FsError::Parse { source, .. } => BuildError::Parse {
                path,
                message: source.to_string(),
            },
            FsError::InvalidEncoding { detail, .. } => BuildError::Encoding {
                path,
                message: detail,
            },
            other => BuildError::Io {
                path,
                message: other.to_string(),
            },
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct BuildReport {
    pub indexed: usize,
    pub errors: Vec<BuildError>,
}

#[derive(Debug, Default, Serialize)]
pub struct UpdateReport {
    pub added: usize,
    pub modified: usize,
    /// Indexed paths dropped, whether deleted from disk or no longer
    /// indexable.
    pub removed: usize,
    pub unchanged: usize,
    pub errors: Vec<BuildError>,
}

/// Outcome of one file within a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileResult {
    Indexed,
    /// Hash matched the stored one; the file was not parsed.
    Skipped,
    /// Indexed path no longer on disk.
    Removed,
    Error(String),
}

pub trait ProgressReporter {
    fn on_file(&mut self, path: &Path, result: FileResult);
    fn on_complete(&mut self, indexed: usize, errors: usize);
}

#[derive(Debug, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_file(&mut self, _path: &Path, _result: FileResult) {}
    fn on_complete(&mut self, _indexed: usize, _errors: usize) {}
}

/// A file skipped because its id belongs to another file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateRecord {
    pub path: PathBuf,
    pub id: NoteId,
    pub first_path: PathBuf,
}

/// Everything one pass writes, applied in a single transaction.
#[derive(Debug, Default)]
pub struct ChangeSet {
    /// Empty all derived tables first.
    pub clear: bool,
    pub removed: Vec<PathBuf>,
    pub upserts: Vec<NoteRecord>,
    /// Replaces the stored duplicate diagnostics.
    pub duplicates: Vec<DuplicateRecord>,
}

/// Scans a notes directory into a [`SqliteIndex`].
///
/// Each pass reads and parses outside the transaction, then commits all its
/// writes at once, so readers see either the previous state or the new one.
pub struct IndexBuilder {
    notes_dir: PathBuf,
}

impl IndexBuilder {
    pub fn new(notes_dir: impl Into<PathBuf>) -> Self {
        Self {
            notes_dir: notes_dir.into(),
        }
    }

    pub fn notes_dir(&self) -> &Path {
        &self.notes_dir
    }

    pub fn full_rebuild(&self, index: &mut SqliteIndex) -> IndexResult<BuildReport> {
        self.full_rebuild_with_progress(index, &mut NoopReporter)
    }

    /// Discards the index and indexes every file again.
    ///
    /// When two files share an id the first in scan order wins.
    pub fn full_rebuild_with_progress<P: ProgressReporter>(
        &self,
        index: &mut SqliteIndex,
        progress: &mut P,
    ) -> IndexResult<BuildReport> {
        let files = self.scan()?;
        let mut changes = ChangeSet {
            clear: true,
            ..ChangeSet::default()
        };
        let mut owners: HashMap<NoteId, PathBuf> = HashMap::new();
        let mut errors = Vec::new();

        for rel in files {
            match read_note(&self.notes_dir.join(&rel)) {
                Ok(parsed) => {
                    stage(rel, parsed, &mut owners, &mut changes, &mut errors, progress);
                }
                Err(e) => record(BuildError::from_fs(e, &rel), &mut errors, progress),
            }
        }

        index.apply_changes(&changes)?;

        let indexed = changes.upserts.len();
        progress.on_complete(indexed, errors.len());
        log::info!(
            "full rebuild of {}: {} indexed, {} error(s)",
            self.notes_dir.display(),
            indexed,
            errors.len()
        );
        Ok(BuildReport { indexed, errors })
    }

    pub fn incremental_update(&self, index: &mut SqliteIndex) -> IndexResult<UpdateReport> {
        self.incremental_update_with_progress(index, &mut NoopReporter)
    }

    /// Re-indexes only files whose bytes changed and drops deleted files.
    ///
    /// Unchanged files are hashed but never parsed. A file reusing an id
    /// that a still-present indexed file owns is skipped, as is one reusing
    /// an id claimed earlier in scan order.
    pub fn incremental_update_with_progress<P: ProgressReporter>(
        &self,
        index: &mut SqliteIndex,
        progress: &mut P,
    ) -> IndexResult<UpdateReport> {
        let stored = index.all_indexed_paths()?;
        let stored_ids = index.indexed_ids()?;
        let files = self.scan()?;
        let present: HashSet<&PathBuf> = files.iter().collect();

        let mut report = UpdateReport::default();
        let mut changes = ChangeSet::default();
        let mut owners: HashMap<NoteId, PathBuf> = HashMap::new();
        let mut unchanged = HashSet::new();
        let mut changed: Vec<(PathBuf, ParsedNote)> = Vec::new();

        for rel in &files {
            let full = self.notes_dir.join(rel);
            let bytes = match read_bytes(&full) {
                Ok(bytes) => bytes,
                Err(e) => {
                    if fail_stored(rel, &stored, &mut changes) {
                        report.removed += 1;
                    }
                    record(BuildError::from_fs(e, rel), &mut report.errors, progress);
                    continue;
                }
            };

            if stored.get(rel) == Some(&ContentHash::compute(&bytes)) {
                unchanged.insert(rel.clone());
                report.unchanged += 1;
                progress.on_file(rel, FileResult::Skipped);
                continue;
            }

            match parse_note_from_bytes(bytes, &full) {
                Ok(parsed) => changed.push((rel.clone(), parsed)),
                Err(e) => {
                    if fail_stored(rel, &stored, &mut changes) {
                        report.removed += 1;
                    }
                    record(BuildError::from_fs(e, rel), &mut report.errors, progress);
                }
            }
        }

        // Unchanged files keep their ids; so do changed files that still
        // carry the id they were indexed under.
        for (id, path) in &stored_ids {
            if unchanged.contains(path)
                && let Ok(id) = id.parse::<NoteId>()
            {
                owners.insert(id, path.clone());
            }
        }
        let (kept, rest): (Vec<_>, Vec<_>) = changed.into_iter().partition(|(rel, parsed)| {
            stored_ids
                .get(&parsed.note.id().to_string())
                .is_some_and(|path| path == rel)
        });

        for (rel, parsed) in kept.into_iter().chain(rest) {
            let was_indexed = stored.contains_key(&rel);
            let staged_before = changes.upserts.len();
            stage(rel.clone(), parsed, &mut owners, &mut changes, &mut report.errors, progress);
            if changes.upserts.len() > staged_before {
                if was_indexed {
                    report.modified += 1;
                } else {
                    report.added += 1;
                }
            } else if fail_stored(&rel, &stored, &mut changes) {
                report.removed += 1;
            }
        }

        let mut gone: Vec<&PathBuf> = stored.keys().filter(|p| !present.contains(p)).collect();
        gone.sort();
        for path in gone {
            progress.on_file(path, FileResult::Removed);
            changes.removed.push(path.clone());
            report.removed += 1;
        }

        index.apply_changes(&changes)?;

        progress.on_complete(report.added + report.modified, report.errors.len());
        log::info!(
            "incremental update of {}: {} added, {} modified, {} removed, {} unchanged, {} error(s)",
            self.notes_dir.display(),
            report.added,
            report.modified,
            report.removed,
            report.unchanged,
            report.errors.len()
        );
        Ok(report)
    }

    fn scan(&self) -> IndexResult<Vec<PathBuf>> {
        scan_notes_directory(&self.notes_dir).map_err(|e| IndexError::Io {
            path: self.notes_dir.clone(),
            source: std::io::Error::other(e),
        })
    }
}

/// Drops the old row of a stored file that can no longer be indexed.
/// Returns whether a row was dropped.
fn fail_stored(
    rel: &Path,
    stored: &HashMap<PathBuf, ContentHash>,
    changes: &mut ChangeSet,
) -> bool {
    let was_stored = stored.contains_key(rel);
    if was_stored {
        changes.removed.push(rel.to_path_buf());
    }
    was_stored
}

/// Stages `parsed` unless another file already owns its id.
fn stage<P: ProgressReporter>(
    rel: PathBuf,
    parsed: ParsedNote,
    owners: &mut HashMap<NoteId, PathBuf>,
    changes: &mut ChangeSet,
    errors: &mut Vec<BuildError>,
    progress: &mut P,
) {
    let id = parsed.note.id().clone();
    if let Some(first_path) = owners.get(&id) {
        changes.duplicates.push(DuplicateRecord {
            path: rel.clone(),
            id: id.clone(),
            first_path: first_path.clone(),
        });
        record(
            BuildError::DuplicateId {
                path: rel,
                id,
                first_path: first_path.clone(),
            },
            errors,
            progress,
        );
        return;
    }

    log::debug!("indexing {}", rel.display());
    owners.insert(id, rel.clone());
    progress.on_file(&rel, FileResult::Indexed);
    changes.upserts.push(NoteRecord::new(rel, parsed));
}

fn record<P: ProgressReporter>(error: BuildError, errors: &mut Vec<BuildError>, progress: &mut P) {
    log::warn!("skipping {}", error);
    progress.on_file(error.path(), FileResult::Error(error.to_string()));
    errors.push(error);
}
