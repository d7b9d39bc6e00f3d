//! Methods backing IndexBuilder passes.

use super::SqliteIndex;
use super::write::{clear_all, delete_by_path, insert_note, mark_built, path_key, prune_unused};
use crate::index::builder::ChangeSet;
use crate::index::{IndexError, IndexResult};
use crate::infra::ContentHash;
use chrono::Utc;
use rusqlite::params;
use std::collections::HashMap;
use std::path::PathBuf;

impl SqliteIndex {
    /// Every indexed path with its stored content hash.
    pub fn all_indexed_paths(&self) -> IndexResult<HashMap<PathBuf, ContentHash>> {
        let mut stmt = self.conn.prepare("SELECT path, content_hash FROM notes")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(path, hash)| {
                let hash = ContentHash::from_hex(&hash)
                    .map_err(|e| IndexError::Corrupt(format!("{path}: {e}")))?;
                Ok((PathBuf::from(path), hash))
            })
            .collect()
    }

    /// Indexed paths keyed by note id.
    pub fn indexed_ids(&self) -> IndexResult<HashMap<String, PathBuf>> {
        let mut stmt = self.conn.prepare("SELECT id, path FROM notes")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, PathBuf::from(row.get::<_, String>(1)?)))
            })?
            .collect::<rusqlite::Result<HashMap<_, _>>>()?;
        Ok(rows)
    }

    /// Applies one build pass atomically.
    ///
    /// Order: optional clear, removals, upserts, duplicate diagnostics,
    /// pruning of unused topics and tags, build marker. Any failure rolls
    /// the whole pass back.
    pub fn apply_changes(&mut self, changes: &ChangeSet) -> IndexResult<()> {
        let tx = self.transaction()?;
        let conn = tx.conn();

        if changes.clear {
            clear_all(conn)?;
        }
        for path in &changes.removed {
            delete_by_path(conn, path)?;
        }
        for record in &changes.upserts {
            insert_note(conn, record)?;
        }

        conn.execute("DELETE FROM duplicate_ids", [])?;
        for dup in &changes.duplicates {
            conn.prepare_cached(
                "INSERT OR REPLACE INTO duplicate_ids (path, id, first_path) VALUES (?1, ?2, ?3)",
            )?
            .execute(params![
                path_key(&dup.path),
                dup.id.to_string(),
                path_key(&dup.first_path)
            ])?;
        }

        prune_unused(conn)?;
        mark_built(conn, Utc::now())?;
        tx.commit()
    }
}
