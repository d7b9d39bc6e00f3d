//! The derived SQLite index and the passes that build it.

pub mod builder;
pub mod integrity;
mod repository;
pub mod schema;
mod sqlite;

pub use builder::{
    BuildError, BuildReport, FileResult, IndexBuilder, NoopReporter, ProgressReporter,
    UpdateReport,
};
pub use integrity::{IntegrityIssue, IntegrityReport, IssueKind, Severity};
pub use repository::{
    Backlink, IndexError, IndexRepository, IndexResult, IndexState, IndexedNote, NoteRecord,
    RelWithCount, SearchResult, SearchWeights, TagWithCount, TopicFilter, TopicWithCount,
};
pub use sqlite::{SqliteIndex, Transaction};
