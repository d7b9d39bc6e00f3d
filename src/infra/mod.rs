//! File reading, frontmatter parsing and content hashing

mod content_hash;
mod frontmatter;
mod fs;

pub use content_hash::{ContentHash, ContentHashError};
pub use frontmatter::{ParseError, ParsedNote, parse};
pub use fs::{FsError, parse_note_from_bytes, read_bytes, read_note, scan_notes_directory};
