//! Findings of the index consistency check.
//!
//! Issues are advisory: they describe the indexed state and never block a
//! build. Only [`IndexRepository::repair_dangling_links`] acts on them.
//!
//! [`IndexRepository::repair_dangling_links`]: crate::index::IndexRepository::repair_dangling_links

use crate::domain::NoteId;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityIssue {
    /// File the issue belongs to, relative to the notes root.
    pub path: PathBuf,
    #[serde(flatten)]
    pub kind: IssueKind,
}

impl IntegrityIssue {
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueKind {
    /// A link whose target id is not indexed.
    BrokenLink { source: NoteId, target: NoteId },

    /// A note filed under no topic.
    Orphaned { id: NoteId },

    /// A file skipped by the last build because another file owns its id.
    DuplicateId { id: NoteId, first_path: PathBuf },
}

impl IssueKind {
    pub fn severity(&self) -> Severity {
        match self {
            IssueKind::BrokenLink { .. } | IssueKind::DuplicateId { .. } => Severity::Error,
            IssueKind::Orphaned { .. } => Severity::Warning,
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::BrokenLink { target, .. } => {
                write!(f, "broken link to '{}'", target.prefix())
            }
            IssueKind::Orphaned { .. } => f.write_str("orphaned note (no topics)"),
            IssueKind::DuplicateId { id, first_path } => write!(
                f,
                "duplicate id '{}' (indexed from {})",
                id.prefix(),
                first_path.display()
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// Result of [`crate::index::IndexRepository::integrity_check`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub issues: Vec<IntegrityIssue>,
    /// False when the search index no longer matches the note rows.
    pub search_index_consistent: bool,
}

impl IntegrityReport {
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn broken_links(&self) -> impl Iterator<Item = &IntegrityIssue> {
        self.issues
            .iter()
            .filter(|i| matches!(i.kind, IssueKind::BrokenLink { .. }))
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty() && self.search_index_consistent
    }

    fn count(&self, severity: Severity) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity() == severity)
            .count()
    }
}
