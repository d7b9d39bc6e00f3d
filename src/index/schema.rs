//! SQLite schema for the notes index.

use rusqlite::{Connection, ErrorCode, OptionalExtension};

/// Schema version written by this build.
pub const SCHEMA_VERSION: i64 = 1;

/// Creates every table, index and trigger of the index.
///
/// Idempotent. Tables:
/// - `notes`: one row per indexed file, including body and joined aliases
/// - `topics` / `note_topics`: topic paths and their note associations
/// - `aliases`: per-note alternate titles, in written order
/// - `tags` / `note_tags`: tag names and their note associations
/// - `links` / `link_rels`: one row per (source, target), with its rels
/// - `index_meta`: build-state key/value pairs
/// - `duplicate_ids`: files skipped by the last build for reusing an id
/// - `schema_version`
///
/// `notes_fts` is an external-content FTS5 table over `notes`; triggers keep
/// it in step with every insert, update and delete.
pub fn create_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS notes (
            id TEXT PRIMARY KEY,
            path TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            description TEXT,
            created TEXT NOT NULL,
            modified TEXT NOT NULL,
            content_hash TEXT NOT NULL,
            body TEXT NOT NULL DEFAULT '',
            aliases_text TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS topics (
            id INTEGER PRIMARY KEY,
            path TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS note_topics (
            note_id TEXT NOT NULL REFERENCES notes(id) ON DELETE CASCADE,
            topic_id INTEGER NOT NULL REFERENCES topics(id) ON DELETE CASCADE,
            PRIMARY KEY (note_id, topic_id)
        );

        CREATE TABLE IF NOT EXISTS aliases (
            note_id TEXT NOT NULL REFERENCES notes(id) ON DELETE CASCADE,
            alias TEXT NOT NULL,
            position INTEGER NOT NULL,
            PRIMARY KEY (note_id, alias)
        );

        CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS note_tags (
            note_id TEXT NOT NULL REFERENCES notes(id) ON DELETE CASCADE,
            tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
            PRIMARY KEY (note_id, tag_id)
        );

        CREATE TABLE IF NOT EXISTS links (
            id INTEGER PRIMARY KEY,
            source_id TEXT NOT NULL REFERENCES notes(id) ON DELETE CASCADE,
            target_id TEXT NOT NULL,
            note TEXT,
            UNIQUE (source_id, target_id)
        );

        CREATE TABLE IF NOT EXISTS link_rels (
            link_id INTEGER NOT NULL REFERENCES links(id) ON DELETE CASCADE,
            rel TEXT NOT NULL,
            PRIMARY KEY (link_id, rel)
        );

        CREATE TABLE IF NOT EXISTS index_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS duplicate_ids (
            path TEXT PRIMARY KEY,
            id TEXT NOT NULL,
            first_path TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_note_topics_topic ON note_topics(topic_id);
        CREATE INDEX IF NOT EXISTS idx_note_tags_tag ON note_tags(tag_id);
        CREATE INDEX IF NOT EXISTS idx_aliases_alias ON aliases(alias COLLATE NOCASE);
        CREATE INDEX IF NOT EXISTS idx_links_target ON links(target_id);
        CREATE INDEX IF NOT EXISTS idx_link_rels_rel ON link_rels(rel);
        CREATE INDEX IF NOT EXISTS idx_notes_title ON notes(title COLLATE NOCASE);
        CREATE INDEX IF NOT EXISTS idx_notes_modified ON notes(modified);",
    )?;

    // Column names must match `notes` for 'rebuild' and 'integrity-check'.
    conn.execute_batch(
        "CREATE VIRTUAL TABLE IF NOT EXISTS notes_fts USING fts5(
            title,
            description,
            aliases_text,
            body,
            content='notes',
            content_rowid='rowid'
        );

        CREATE TRIGGER IF NOT EXISTS notes_fts_insert AFTER INSERT ON notes BEGIN
            INSERT INTO notes_fts(rowid, title, description, aliases_text, body)
            VALUES (NEW.rowid, NEW.title, NEW.description, NEW.aliases_text, NEW.body);
        END;

        CREATE TRIGGER IF NOT EXISTS notes_fts_delete AFTER DELETE ON notes BEGIN
            INSERT INTO notes_fts(notes_fts, rowid, title, description, aliases_text, body)
            VALUES ('delete', OLD.rowid, OLD.title, OLD.description, OLD.aliases_text, OLD.body);
        END;

        CREATE TRIGGER IF NOT EXISTS notes_fts_update AFTER UPDATE ON notes BEGIN
            INSERT INTO notes_fts(notes_fts, rowid, title, description, aliases_text, body)
            VALUES ('delete', OLD.rowid, OLD.title, OLD.description, OLD.aliases_text, OLD.body);
            INSERT INTO notes_fts(rowid, title, description, aliases_text, body)
            VALUES (NEW.rowid, NEW.title, NEW.description, NEW.aliases_text, NEW.body);
        END;",
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
        [SCHEMA_VERSION],
    )?;

    Ok(())
}

/// Highest recorded schema version, `None` for a database without the table.
pub fn get_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
            [],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    if !has_table {
        return Ok(None);
    }
    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
}

/// Rebuilds the search index from the `notes` rows.
pub fn rebuild_fts(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute("INSERT INTO notes_fts(notes_fts) VALUES('rebuild')", [])?;
    Ok(())
}

/// Compares the search index against the `notes` rows.
///
/// Returns `Ok(false)` when FTS5 reports the index as corrupt relative to
/// its content table.
pub fn check_fts(conn: &Connection) -> rusqlite::Result<bool> {
    let result = conn.execute(
        "INSERT INTO notes_fts(notes_fts, rank) VALUES('integrity-check', 1)",
        [],
    );
    match result {
        Ok(_) => Ok(true),
        Err(rusqlite::Error::SqliteFailure(err, _)) if err.code == ErrorCode::DatabaseCorrupt => {
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();
        conn
    }

    fn exists(conn: &Connection, kind: &str, name: &str) -> bool {
        conn.query_row(
            "SELECT 1 FROM sqlite_master WHERE type = ?1 AND name = ?2",
            [kind, name],
            |_| Ok(()),
        )
        .is_ok()
    }

    fn insert_note(conn: &Connection, id: &str, path: &str, title: &str, body: &str) {
        conn.execute(
            "INSERT INTO notes (id, path, title, created, modified, content_hash, body)
             VALUES (?1, ?2, ?3, '2024-01-15T10:30:00Z', '2024-01-15T10:30:00Z', 'h', ?4)",
            [id, path, title, body],
        )
        .unwrap();
    }

    fn fts_hits(conn: &Connection, query: &str) -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM notes_fts WHERE notes_fts MATCH ?1",
            [query],
            |r| r.get(0),
        )
        .unwrap()
    }

    #[test]
    fn creates_all_tables_and_triggers() {
        let conn = conn();
        for table in [
            "notes",
            "topics",
            "note_topics",
            "aliases",
            "tags",
            "note_tags",
            "links",
            "link_rels",
            "index_meta",
            "duplicate_ids",
            "schema_version",
            "notes_fts",
        ] {
            assert!(exists(&conn, "table", table), "missing table {table}");
        }
        for trigger in ["notes_fts_insert", "notes_fts_delete", "notes_fts_update"] {
            assert!(exists(&conn, "trigger", trigger), "missing trigger {trigger}");
        }
        assert!(exists(&conn, "index", "idx_links_target"));
    }

    #[test]
    fn create_schema_is_idempotent_and_keeps_data() {
        let conn = conn();
        insert_note(&conn, "A", "a.md", "Title", "");
        create_schema(&conn).unwrap();
        create_schema(&conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM notes", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(get_schema_version(&conn).unwrap(), Some(SCHEMA_VERSION));
    }

    #[test]
    fn schema_version_absent_before_creation() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), None);
    }

    #[test]
    fn schema_version_reports_maximum() {
        let conn = conn();
        conn.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (7, datetime('now'))",
            [],
        )
        .unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), Some(7));
    }

    #[test]
    fn deleting_a_note_cascades() {
        let conn = conn();
        insert_note(&conn, "A", "a.md", "Title", "");
        conn.execute_batch(
            "INSERT INTO topics (id, path) VALUES (1, 'software');
             INSERT INTO note_topics VALUES ('A', 1);
             INSERT INTO aliases VALUES ('A', 'alias', 0);
             INSERT INTO links (id, source_id, target_id) VALUES (1, 'A', 'B');
             INSERT INTO link_rels VALUES (1, 'parent');
             DELETE FROM notes WHERE id = 'A';",
        )
        .unwrap();

        for table in ["note_topics", "aliases", "links", "link_rels"] {
            let n: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
                .unwrap();
            assert_eq!(n, 0, "{table} should be empty");
        }
    }

    #[test]
    fn links_may_dangle_but_sources_may_not() {
        let conn = conn();
        insert_note(&conn, "A", "a.md", "Title", "");
        conn.execute(
            "INSERT INTO links (source_id, target_id) VALUES ('A', 'MISSING')",
            [],
        )
        .unwrap();
        assert!(
            conn.execute(
                "INSERT INTO links (source_id, target_id) VALUES ('MISSING', 'A')",
                [],
            )
            .is_err()
        );
    }

    #[test]
    fn triggers_track_insert_update_delete() {
        let conn = conn();
        insert_note(&conn, "A", "a.md", "Kubernetes", "deployment notes");
        assert_eq!(fts_hits(&conn, "kubernetes"), 1);

        conn.execute("UPDATE notes SET title = 'Docker' WHERE id = 'A'", [])
            .unwrap();
        assert_eq!(fts_hits(&conn, "kubernetes"), 0);
        assert_eq!(fts_hits(&conn, "docker"), 1);

        conn.execute("DELETE FROM notes WHERE id = 'A'", []).unwrap();
        assert_eq!(fts_hits(&conn, "docker"), 0);
        assert!(check_fts(&conn).unwrap());
    }

    #[test]
    fn check_detects_drift_and_rebuild_repairs_it() {
        let conn = conn();
        insert_note(&conn, "A", "a.md", "Kubernetes", "");
        conn.execute_batch(
            "DROP TRIGGER notes_fts_update;
             UPDATE notes SET title = 'Docker' WHERE id = 'A';",
        )
        .unwrap();

        assert!(!check_fts(&conn).unwrap());
        rebuild_fts(&conn).unwrap();
        assert!(check_fts(&conn).unwrap());
        assert_eq!(fts_hits(&conn, "docker"), 1);
    }
}
