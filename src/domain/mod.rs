//! Core types: NoteId (ULID), Topic, Tag, Rel, Link, Note

mod link;
mod note;
mod note_id;
mod tag;
mod topic;

pub use link::{Link, ParseLinkError, ParseRelError, Rel};
pub use note::{Note, NoteBuilder, ParseNoteError};
pub use note_id::{NoteId, ParseNoteIdError};
pub use tag::{ParseTagError, Tag};
pub use topic::{ParseTopicError, Topic};
