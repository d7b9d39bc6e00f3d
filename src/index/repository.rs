//! IndexRepository trait and the values it returns.

use crate::domain::{Note, NoteId, Rel, Tag, Topic};
use crate::index::integrity::IntegrityReport;
use crate::infra::{ContentHash, ParsedNote};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("note not found: {id}")]
    NoteNotFound { id: String },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored row could not be decoded back into domain values.
    #[error("corrupt index row: {0}")]
    Corrupt(String),

    #[error("index schema version {found} is newer than supported version {supported}")]
    UnsupportedSchema { found: i64, supported: i64 },
}

pub type IndexResult<T> = Result<T, IndexError>;

/// Everything needed to write one note into the index.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteRecord {
    /// Path relative to the notes root.
    pub path: PathBuf,
    pub note: Note,
    pub body: String,
    pub content_hash: ContentHash,
}

impl NoteRecord {
    pub fn new(path: impl Into<PathBuf>, parsed: ParsedNote) -> Self {
        Self {
            path: path.into(),
            note: parsed.note,
            body: parsed.body,
            content_hash: parsed.content_hash,
        }
    }
}

/// A note as read back from the index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexedNote {
    #[serde(flatten)]
    note: Note,
    path: PathBuf,
    content_hash: ContentHash,
    #[serde(skip)]
    body: String,
}

impl IndexedNote {
    pub fn new(note: Note, path: PathBuf, content_hash: ContentHash, body: String) -> Self {
        Self {
            note,
            path,
            content_hash,
            body,
        }
    }

    pub fn note(&self) -> &Note {
        &self.note
    }

    pub fn id(&self) -> &NoteId {
        self.note.id()
    }

    pub fn title(&self) -> &str {
        self.note.title()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content_hash(&self) -> &ContentHash {
        &self.content_hash
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

/// A full-text hit. Higher scores rank first.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub note: IndexedNote,
    pub score: f64,
    pub snippet: Option<String>,
}

/// A note linking to the queried note, with the link that does it.
#[derive(Debug, Clone, Serialize)]
pub struct Backlink {
    pub source: IndexedNote,
    pub rels: Vec<Rel>,
    pub context: Option<String>,
}

/// Column weights for search ranking.
///
/// A match in a heavier column adds more to the score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchWeights {
    pub title: f64,
    pub description: f64,
    pub aliases: f64,
    pub body: f64,
}

impl Default for SearchWeights {
    fn default() -> Self {
        Self {
            title: 10.0,
            description: 5.0,
            aliases: 5.0,
            body: 1.0,
        }
    }
}

/// A topic query as typed by a caller.
///
/// A trailing `/` selects the topic and all its descendants; without it only
/// notes filed under exactly that path match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicFilter {
    pub topic: Topic,
    pub include_descendants: bool,
}

impl TopicFilter {
    pub fn parse(input: &str) -> IndexResult<Self> {
        let trimmed = input.trim();
        let include_descendants = trimmed.ends_with('/');
        let topic = Topic::new(trimmed).map_err(|e| IndexError::InvalidQuery(e.to_string()))?;
        Ok(Self {
            topic,
            include_descendants,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicWithCount {
    pub topic: Topic,
    /// Notes filed under exactly this path.
    pub exact_count: u32,
    /// Notes filed under this path or any descendant, each counted once.
    pub total_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagWithCount {
    pub tag: Tag,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelWithCount {
    pub rel: Rel,
    pub count: u32,
}

/// Lifecycle of a store: created empty, then built by the first pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum IndexState {
    Uninitialized,
    Built { at: DateTime<Utc> },
}

impl IndexState {
    pub fn is_built(&self) -> bool {
        matches!(self, IndexState::Built { .. })
    }
}

/// Storage and query interface of the notes index.
///
/// Listing methods order by title (case-insensitive), then id.
pub trait IndexRepository {
    /// Writes a note, replacing any previous row for its id or path.
    ///
    /// Topics, tags, aliases and links are replaced, never merged.
    fn upsert(&mut self, record: &NoteRecord) -> IndexResult<()>;

    /// Writes many notes in one transaction.
    fn upsert_batch(&mut self, records: &[NoteRecord]) -> IndexResult<()>;

    /// Removes a note and its associations. Returns whether it existed.
    fn remove(&mut self, id: &NoteId) -> IndexResult<bool>;

    fn get(&self, id: &NoteId) -> IndexResult<Option<IndexedNote>>;

    fn list_all(&self) -> IndexResult<Vec<IndexedNote>>;

    /// Notes filed under `topic`, or under it or any descendant.
    fn list_by_topic(&self, topic: &Topic, include_descendants: bool)
    -> IndexResult<Vec<IndexedNote>>;

    /// Notes carrying every tag in `tags`.
    fn list_by_tags(&self, tags: &[Tag]) -> IndexResult<Vec<IndexedNote>>;

    /// Ranked full-text search over title, description, aliases and body.
    fn search(&self, query: &str) -> IndexResult<Vec<SearchResult>>;

    /// Notes linking to `id`, optionally only through `rel`.
    fn backlinks(&self, id: &NoteId, rel: Option<&Rel>) -> IndexResult<Vec<Backlink>>;

    fn topic_counts(&self) -> IndexResult<Vec<TopicWithCount>>;

    fn tag_counts(&self) -> IndexResult<Vec<TagWithCount>>;

    fn rel_counts(&self) -> IndexResult<Vec<RelWithCount>>;

    /// Case-insensitive id prefix match. An empty prefix matches nothing.
    fn find_by_id_prefix(&self, prefix: &str) -> IndexResult<Vec<IndexedNote>>;

    /// Case-insensitive exact title match.
    fn find_by_title(&self, title: &str) -> IndexResult<Vec<IndexedNote>>;

    /// Case-insensitive exact alias match.
    fn find_by_alias(&self, alias: &str) -> IndexResult<Vec<IndexedNote>>;

    fn content_hash(&self, path: &Path) -> IndexResult<Option<ContentHash>>;

    /// Read-only consistency report.
    fn integrity_check(&self) -> IndexResult<IntegrityReport>;

    /// Deletes link rows whose target is not indexed. Returns how many.
    fn repair_dangling_links(&mut self) -> IndexResult<usize>;

    fn index_state(&self) -> IndexResult<IndexState>;
}
