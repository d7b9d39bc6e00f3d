//! Row decoding shared by every query that returns notes.
//!
//! A note and all its associations come back in one row: topics, tags,
//! aliases and links are folded into JSON arrays by correlated
//! `json_group_array` subqueries and decoded with serde_json.

use crate::domain::{Link, Note, NoteId, Tag, Topic};
use crate::index::{IndexError, IndexResult, IndexedNote};
use crate::infra::ContentHash;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Params, Row};
use serde::de::DeserializeOwned;
use std::path::PathBuf;

/// Columns selecting one full note from `notes n`. Decoded by [`NoteRow`].
///
/// Link rels are wrapped in `json()` because a scalar subquery drops the
/// JSON subtype and the array would otherwise be embedded as a string.
pub(super) const NOTE_COLUMNS: &str = "
    n.id, n.path, n.title, n.description, n.created, n.modified, n.content_hash, n.body,
    (SELECT json_group_array(a.alias ORDER BY a.position)
       FROM aliases a WHERE a.note_id = n.id),
    (SELECT json_group_array(t.path ORDER BY t.path)
       FROM note_topics nt JOIN topics t ON t.id = nt.topic_id WHERE nt.note_id = n.id),
    (SELECT json_group_array(t.name ORDER BY t.name)
       FROM note_tags nt JOIN tags t ON t.id = nt.tag_id WHERE nt.note_id = n.id),
    (SELECT json_group_array(json_object(
                'id', l.target_id,
                'rel', json((SELECT json_group_array(lr.rel ORDER BY lr.rel)
                               FROM link_rels lr WHERE lr.link_id = l.id)),
                'note', l.note) ORDER BY l.target_id)
       FROM links l WHERE l.source_id = n.id)";

/// Number of columns in [`NOTE_COLUMNS`]; extra columns start here.
pub(super) const NOTE_COLUMN_COUNT: usize = 12;

pub(super) const ORDER_BY_TITLE: &str = "ORDER BY n.title COLLATE NOCASE, n.id";

/// Undecoded column values of one note.
pub(super) struct NoteRow {
    id: String,
    path: String,
    title: String,
    description: Option<String>,
    created: String,
    modified: String,
    content_hash: String,
    body: String,
    aliases: String,
    topics: String,
    tags: String,
    links: String,
}

impl NoteRow {
    pub(super) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            path: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            created: row.get(4)?,
            modified: row.get(5)?,
            content_hash: row.get(6)?,
            body: row.get(7)?,
            aliases: row.get(8)?,
            topics: row.get(9)?,
            tags: row.get(10)?,
            links: row.get(11)?,
        })
    }

    pub(super) fn decode(self) -> IndexResult<IndexedNote> {
        let id: NoteId = self
            .id
            .parse()
            .map_err(|e| corrupt(&self.id, "id", e))?;
        let created = parse_timestamp(&self.id, "created", &self.created)?;
        let modified = parse_timestamp(&self.id, "modified", &self.modified)?;
        let content_hash =
            ContentHash::from_hex(&self.content_hash).map_err(|e| corrupt(&self.id, "hash", e))?;

        let aliases: Vec<String> = decode_json(&self.id, "aliases", &self.aliases)?;
        let topics: Vec<Topic> = decode_json(&self.id, "topics", &self.topics)?;
        let tags: Vec<Tag> = decode_json(&self.id, "tags", &self.tags)?;
        let links: Vec<Link> = decode_json(&self.id, "links", &self.links)?;

        let note = Note::builder(id, self.title, created, modified)
            .description(self.description)
            .aliases(aliases)
            .topics(topics)
            .tags(tags)
            .links(links)
            .build()
            .map_err(|e| corrupt(&self.id, "title", e))?;

        Ok(IndexedNote::new(
            note,
            PathBuf::from(self.path),
            content_hash,
            self.body,
        ))
    }
}

/// Runs `sql` and decodes each row's leading note columns.
pub(super) fn query_notes<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> IndexResult<Vec<IndexedNote>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let rows = stmt
        .query_map(params, NoteRow::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter().map(NoteRow::decode).collect()
}

/// `SELECT <note columns> FROM notes n <tail>`.
pub(super) fn select_notes(tail: &str) -> String {
    format!("SELECT {NOTE_COLUMNS} FROM notes n {tail}")
}

pub(super) fn decode_json<T: DeserializeOwned>(id: &str, what: &str, json: &str) -> IndexResult<T> {
    serde_json::from_str(json).map_err(|e| corrupt(id, what, e))
}

fn parse_timestamp(id: &str, what: &str, value: &str) -> IndexResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| corrupt(id, what, e))
}

fn corrupt(id: &str, what: &str, err: impl std::fmt::Display) -> IndexError {
    IndexError::Corrupt(format!("note {id}: bad {what}: {err}"))
}
