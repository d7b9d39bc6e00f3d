//! Statements that mutate the index. Callers own the transaction.

use crate::index::NoteRecord;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, params};
use std::path::Path;

pub(super) const BUILT_AT_KEY: &str = "built_at";

/// Writes `record`, replacing every association of its id.
///
/// A different note indexed at the same path is removed first, so a file
/// whose id was edited leaves no stale row behind.
pub(super) fn insert_note(conn: &Connection, record: &NoteRecord) -> rusqlite::Result<()> {
    let note = &record.note;
    let id = note.id().to_string();
    let path = path_key(&record.path);

    conn.prepare_cached("DELETE FROM notes WHERE path = ?1 AND id <> ?2")?
        .execute(params![path, id])?;

    conn.prepare_cached(
        "INSERT INTO notes
             (id, path, title, description, created, modified, content_hash, body, aliases_text)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(id) DO UPDATE SET
             path = excluded.path,
             title = excluded.title,
             description = excluded.description,
             created = excluded.created,
             modified = excluded.modified,
             content_hash = excluded.content_hash,
             body = excluded.body,
             aliases_text = excluded.aliases_text",
    )?
    .execute(params![
        id,
        path,
        note.title(),
        note.description(),
        timestamp(note.created()),
        timestamp(note.modified()),
        record.content_hash.as_str(),
        record.body,
        note.aliases_text(),
    ])?;

    for table in ["note_topics", "note_tags", "aliases"] {
        conn.prepare_cached(&format!("DELETE FROM {table} WHERE note_id = ?1"))?
            .execute([&id])?;
    }
    conn.prepare_cached("DELETE FROM links WHERE source_id = ?1")?
        .execute([&id])?;

    for topic in note.topics() {
        conn.prepare_cached("INSERT INTO topics (path) VALUES (?1) ON CONFLICT(path) DO NOTHING")?
            .execute([topic.as_str()])?;
        conn.prepare_cached(
            "INSERT INTO note_topics (note_id, topic_id) SELECT ?1, id FROM topics WHERE path = ?2",
        )?
        .execute(params![id, topic.as_str()])?;
    }

    for tag in note.tags() {
        conn.prepare_cached("INSERT INTO tags (name) VALUES (?1) ON CONFLICT(name) DO NOTHING")?
            .execute([tag.as_str()])?;
        conn.prepare_cached(
            "INSERT INTO note_tags (note_id, tag_id) SELECT ?1, id FROM tags WHERE name = ?2",
        )?
        .execute(params![id, tag.as_str()])?;
    }

    for (position, alias) in note.aliases().iter().enumerate() {
        conn.prepare_cached("INSERT INTO aliases (note_id, alias, position) VALUES (?1, ?2, ?3)")?
            .execute(params![id, alias, position as i64])?;
    }

    for link in note.links() {
        conn.prepare_cached("INSERT INTO links (source_id, target_id, note) VALUES (?1, ?2, ?3)")?
            .execute(params![id, link.target().to_string(), link.context()])?;
        let link_id = conn.last_insert_rowid();
        for rel in link.rels() {
            conn.prepare_cached("INSERT INTO link_rels (link_id, rel) VALUES (?1, ?2)")?
                .execute(params![link_id, rel.as_str()])?;
        }
    }

    Ok(())
}

pub(super) fn delete_by_id(conn: &Connection, id: &str) -> rusqlite::Result<usize> {
    conn.prepare_cached("DELETE FROM notes WHERE id = ?1")?
        .execute([id])
}

pub(super) fn delete_by_path(conn: &Connection, path: &Path) -> rusqlite::Result<usize> {
    conn.prepare_cached("DELETE FROM notes WHERE path = ?1")?
        .execute([path_key(path)])
}

/// Drops topic and tag rows no note refers to any more.
pub(super) fn prune_unused(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "DELETE FROM topics WHERE id NOT IN (SELECT topic_id FROM note_topics);
         DELETE FROM tags WHERE id NOT IN (SELECT tag_id FROM note_tags);",
    )
}

/// Empties every derived table. Schema and build marker stay.
pub(super) fn clear_all(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "DELETE FROM notes;
         DELETE FROM topics;
         DELETE FROM tags;
         DELETE FROM duplicate_ids;",
    )
}

pub(super) fn mark_built(conn: &Connection, at: DateTime<Utc>) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO index_meta (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![BUILT_AT_KEY, timestamp(at)],
    )?;
    Ok(())
}

/// Stored form of a relative path; `/`-separated on every platform.
pub(super) fn path_key(path: &Path) -> String {
    let s = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        s.into_owned()
    } else {
        s.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

pub(super) fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
