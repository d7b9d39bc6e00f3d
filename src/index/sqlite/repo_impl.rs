//! IndexRepository implementation for SqliteIndex.

use super::SqliteIndex;
use super::query::{
    NOTE_COLUMN_COUNT, NOTE_COLUMNS, NoteRow, ORDER_BY_TITLE, decode_json, query_notes,
    select_notes,
};
use super::write::{BUILT_AT_KEY, delete_by_id, insert_note, path_key, prune_unused};
use crate::domain::{NoteId, Rel, Tag, Topic};
use crate::index::integrity::{IntegrityIssue, IntegrityReport, IssueKind};
use crate::index::schema::check_fts;
use crate::index::{
    Backlink, IndexError, IndexRepository, IndexResult, IndexState, IndexedNote, NoteRecord,
    RelWithCount, SearchResult, TagWithCount, TopicWithCount,
};
use crate::infra::ContentHash;
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};
use std::path::{Path, PathBuf};

impl IndexRepository for SqliteIndex {
    fn upsert(&mut self, record: &NoteRecord) -> IndexResult<()> {
        self.upsert_batch(std::slice::from_ref(record))
    }

    fn upsert_batch(&mut self, records: &[NoteRecord]) -> IndexResult<()> {
        let tx = self.transaction()?;
        for record in records {
            insert_note(tx.conn(), record)?;
        }
        prune_unused(tx.conn())?;
        tx.commit()
    }

    fn remove(&mut self, id: &NoteId) -> IndexResult<bool> {
        let tx = self.transaction()?;
        let removed = delete_by_id(tx.conn(), &id.to_string())? > 0;
        prune_unused(tx.conn())?;
        tx.commit()?;
        Ok(removed)
    }

    fn get(&self, id: &NoteId) -> IndexResult<Option<IndexedNote>> {
        let sql = select_notes("WHERE n.id = ?1");
        let row = self
            .conn
            .prepare_cached(&sql)?
            .query_row([id.to_string()], NoteRow::from_row)
            .optional()?;
        row.map(NoteRow::decode).transpose()
    }

    fn list_all(&self) -> IndexResult<Vec<IndexedNote>> {
        query_notes(&self.conn, &select_notes(ORDER_BY_TITLE), [])
    }

    fn list_by_topic(
        &self,
        topic: &Topic,
        include_descendants: bool,
    ) -> IndexResult<Vec<IndexedNote>> {
        // Descendants are the half-open range [topic/, topic0), which the
        // unique index on topics.path serves as a range scan.
        let sql = select_notes(&format!(
            "WHERE n.id IN (
                 SELECT nt.note_id FROM note_topics nt
                 JOIN topics t ON t.id = nt.topic_id
                 WHERE t.path = ?1 OR (?2 AND t.path >= ?3 AND t.path < ?4))
             {ORDER_BY_TITLE}"
        ));
        query_notes(
            &self.conn,
            &sql,
            params![
                topic.as_str(),
                include_descendants,
                topic.descendant_lower_bound(),
                topic.descendant_upper_bound()
            ],
        )
    }

    fn list_by_tags(&self, tags: &[Tag]) -> IndexResult<Vec<IndexedNote>> {
        let mut names: Vec<&str> = tags.iter().map(Tag::as_str).collect();
        names.sort_unstable();
        names.dedup();
        if names.is_empty() {
            return Err(IndexError::InvalidQuery(
                "at least one tag is required".to_string(),
            ));
        }

        let names_json = serde_json::to_string(&names)
            .map_err(|e| IndexError::InvalidQuery(e.to_string()))?;
        let sql = select_notes(&format!(
            "WHERE n.id IN (
                 SELECT nt.note_id FROM note_tags nt
                 JOIN tags t ON t.id = nt.tag_id
                 WHERE t.name IN (SELECT value FROM json_each(?1))
                 GROUP BY nt.note_id
                 HAVING COUNT(DISTINCT t.id) = ?2)
             {ORDER_BY_TITLE}"
        ));
        query_notes(&self.conn, &sql, params![names_json, names.len() as i64])
    }

    fn search(&self, query: &str) -> IndexResult<Vec<SearchResult>> {
        if query.trim().is_empty() {
            return Err(IndexError::InvalidQuery(
                "search query cannot be empty".to_string(),
            ));
        }

        let w = self.search_weights();
        let sql = format!(
            "WITH hits AS (
                 SELECT rowid,
                        -bm25(notes_fts, ?2, ?3, ?4, ?5) AS score,
                        snippet(notes_fts, -1, '[', ']', '...', 12) AS snippet
                 FROM notes_fts WHERE notes_fts MATCH ?1)
             SELECT {NOTE_COLUMNS}, hits.score, hits.snippet
             FROM hits JOIN notes n ON n.rowid = hits.rowid
             ORDER BY hits.score DESC, n.title COLLATE NOCASE, n.id"
        );

        let mut stmt = self.conn.prepare_cached(&sql).map_err(fts_error)?;
        let rows = stmt
            .query_map(
                params![query, w.title, w.description, w.aliases, w.body],
                |row| {
                    Ok((
                        NoteRow::from_row(row)?,
                        row.get::<_, f64>(NOTE_COLUMN_COUNT)?,
                        row.get::<_, Option<String>>(NOTE_COLUMN_COUNT + 1)?,
                    ))
                },
            )
            .map_err(fts_error)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(fts_error)?;

        rows.into_iter()
            .map(|(note, score, snippet)| {
                Ok(SearchResult {
                    note: note.decode()?,
                    score,
                    snippet: snippet.filter(|s| !s.is_empty()),
                })
            })
            .collect()
    }

    fn backlinks(&self, id: &NoteId, rel: Option<&Rel>) -> IndexResult<Vec<Backlink>> {
        let sql = format!(
            "SELECT {NOTE_COLUMNS},
                    (SELECT json_group_array(lr.rel ORDER BY lr.rel)
                       FROM link_rels lr WHERE lr.link_id = l.id),
                    l.note
             FROM links l JOIN notes n ON n.id = l.source_id
             WHERE l.target_id = ?1
               AND (?2 IS NULL OR EXISTS (
                    SELECT 1 FROM link_rels lr WHERE lr.link_id = l.id AND lr.rel = ?2))
             {ORDER_BY_TITLE}"
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt
            .query_map(params![id.to_string(), rel.map(Rel::as_str)], |row| {
                Ok((
                    NoteRow::from_row(row)?,
                    row.get::<_, String>(NOTE_COLUMN_COUNT)?,
                    row.get::<_, Option<String>>(NOTE_COLUMN_COUNT + 1)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(note, rels, context)| {
                let source = note.decode()?;
                let rels: Vec<Rel> = decode_json(&source.id().to_string(), "rels", &rels)?;
                Ok(Backlink {
                    source,
                    rels,
                    context,
                })
            })
            .collect()
    }

    fn topic_counts(&self) -> IndexResult<Vec<TopicWithCount>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT t.path,
                    (SELECT COUNT(*) FROM note_topics nt WHERE nt.topic_id = t.id),
                    (SELECT COUNT(DISTINCT nt.note_id)
                       FROM note_topics nt JOIN topics d ON d.id = nt.topic_id
                      WHERE d.path = t.path
                         OR (d.path >= t.path || '/' AND d.path < t.path || '0'))
             FROM topics t
             ORDER BY t.path",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, u32>(1)?,
                    row.get::<_, u32>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(path, exact_count, total_count)| {
                let topic = Topic::new(&path)
                    .map_err(|e| IndexError::Corrupt(format!("topic {path}: {e}")))?;
                Ok(TopicWithCount {
                    topic,
                    exact_count,
                    total_count,
                })
            })
            .collect()
    }

    fn tag_counts(&self) -> IndexResult<Vec<TagWithCount>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT t.name, COUNT(nt.note_id)
             FROM tags t JOIN note_tags nt ON nt.tag_id = t.id
             GROUP BY t.id
             ORDER BY t.name",
        )?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(name, count)| {
                let tag =
                    Tag::new(&name).map_err(|e| IndexError::Corrupt(format!("tag {name}: {e}")))?;
                Ok(TagWithCount { tag, count })
            })
            .collect()
    }

    fn rel_counts(&self) -> IndexResult<Vec<RelWithCount>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT rel, COUNT(*) FROM link_rels GROUP BY rel ORDER BY rel",
        )?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(name, count)| {
                let rel =
                    Rel::new(&name).map_err(|e| IndexError::Corrupt(format!("rel {name}: {e}")))?;
                Ok(RelWithCount { rel, count })
            })
            .collect()
    }

    fn find_by_id_prefix(&self, prefix: &str) -> IndexResult<Vec<IndexedNote>> {
        let prefix = prefix.trim().to_ascii_uppercase();
        if prefix.is_empty() {
            return Ok(Vec::new());
        }
        let sql = select_notes(&format!(
            "WHERE substr(n.id, 1, length(?1)) = ?1 {ORDER_BY_TITLE}"
        ));
        query_notes(&self.conn, &sql, [prefix])
    }

    fn find_by_title(&self, title: &str) -> IndexResult<Vec<IndexedNote>> {
        let sql = select_notes(&format!(
            "WHERE n.title = ?1 COLLATE NOCASE {ORDER_BY_TITLE}"
        ));
        query_notes(&self.conn, &sql, [title.trim()])
    }

    fn find_by_alias(&self, alias: &str) -> IndexResult<Vec<IndexedNote>> {
        let sql = select_notes(&format!(
            "WHERE n.id IN (SELECT note_id FROM aliases WHERE alias = ?1 COLLATE NOCASE)
             {ORDER_BY_TITLE}"
        ));
        query_notes(&self.conn, &sql, [alias.trim()])
    }

    fn content_hash(&self, path: &Path) -> IndexResult<Option<ContentHash>> {
        let hash: Option<String> = self
            .conn
            .prepare_cached("SELECT content_hash FROM notes WHERE path = ?1")?
            .query_row([path_key(path)], |row| row.get(0))
            .optional()?;
        hash.map(|h| {
            ContentHash::from_hex(&h).map_err(|e| IndexError::Corrupt(format!("{}: {e}", path.display())))
        })
        .transpose()
    }

    fn integrity_check(&self) -> IndexResult<IntegrityReport> {
        let mut issues = Vec::new();

        let mut stmt = self.conn.prepare(
            "SELECT n.path, l.source_id, l.target_id
             FROM links l JOIN notes n ON n.id = l.source_id
             WHERE NOT EXISTS (SELECT 1 FROM notes t WHERE t.id = l.target_id)
             ORDER BY n.path, l.target_id",
        )?;
        let broken = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for (path, source, target) in broken {
            issues.push(IntegrityIssue {
                path: PathBuf::from(path),
                kind: IssueKind::BrokenLink {
                    source: parse_id(&source)?,
                    target: parse_id(&target)?,
                },
            });
        }

        let mut stmt = self.conn.prepare(
            "SELECT n.path, n.id FROM notes n
             WHERE NOT EXISTS (SELECT 1 FROM note_topics nt WHERE nt.note_id = n.id)
             ORDER BY n.path",
        )?;
        let orphaned = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for (path, id) in orphaned {
            issues.push(IntegrityIssue {
                path: PathBuf::from(path),
                kind: IssueKind::Orphaned { id: parse_id(&id)? },
            });
        }

        let mut stmt = self
            .conn
            .prepare("SELECT path, id, first_path FROM duplicate_ids ORDER BY path")?;
        let duplicates = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for (path, id, first_path) in duplicates {
            issues.push(IntegrityIssue {
                path: PathBuf::from(path),
                kind: IssueKind::DuplicateId {
                    id: parse_id(&id)?,
                    first_path: PathBuf::from(first_path),
                },
            });
        }

        issues.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(IntegrityReport {
            issues,
            search_index_consistent: check_fts(&self.conn)?,
        })
    }

    fn repair_dangling_links(&mut self) -> IndexResult<usize> {
        let tx = self.transaction()?;
        let removed = tx.conn().execute(
            "DELETE FROM links WHERE target_id NOT IN (SELECT id FROM notes)",
            [],
        )?;
        tx.commit()?;
        if removed > 0 {
            log::info!("removed {} dangling link(s)", removed);
        }
        Ok(removed)
    }

    fn index_state(&self) -> IndexResult<IndexState> {
        let built_at: Option<String> = self
            .conn
            .prepare_cached("SELECT value FROM index_meta WHERE key = ?1")?
            .query_row([BUILT_AT_KEY], |row| row.get(0))
            .optional()?;

        match built_at {
            None => Ok(IndexState::Uninitialized),
            Some(value) => {
                let at = DateTime::parse_from_rfc3339(&value)
                    .map_err(|e| IndexError::Corrupt(format!("build marker {value}: {e}")))?
                    .with_timezone(&Utc);
                Ok(IndexState::Built { at })
            }
        }
    }
}

fn parse_id(s: &str) -> IndexResult<NoteId> {
    s.parse()
        .map_err(|e| IndexError::Corrupt(format!("stored id: {e}")))
}

/// Syntax errors in a MATCH expression are the caller's fault, not storage
/// failures.
fn fts_error(e: rusqlite::Error) -> IndexError {
    match &e {
        rusqlite::Error::SqliteFailure(_, Some(msg))
            if ["fts5", "syntax error", "no such column", "unterminated string"]
                .iter()
                .any(|needle| msg.contains(needle)) =>
        {
            IndexError::InvalidQuery(format!("invalid search query: {msg}"))
        }
        _ => IndexError::Database(e),
    }
}
