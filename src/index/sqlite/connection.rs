//! Opening connections and starting transactions.

use super::SqliteIndex;
use super::transaction::Transaction;
use crate::index::schema::{SCHEMA_VERSION, check_fts, create_schema, get_schema_version, rebuild_fts};
use crate::index::{IndexError, IndexResult, SearchWeights};
use rusqlite::{Connection, OpenFlags};
use std::fs;
use std::path::Path;
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

impl SqliteIndex {
    /// Opens a private in-memory index, mostly for tests.
    pub fn open_in_memory() -> IndexResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    /// Opens or creates the index at `path`, creating parent directories.
    ///
    /// The database runs in WAL mode so readers never see a half-applied
    /// build, and waits up to five seconds for a competing writer.
    pub fn open(path: &Path) -> IndexResult<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| IndexError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        log::debug!("opened {} (journal_mode={})", path.display(), mode);
        Self::init(conn)
    }

    /// Opens an existing index without creating or migrating anything.
    pub fn open_read_only(path: &Path) -> IndexResult<Self> {
        if !path.exists() {
            return Err(IndexError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "index does not exist"),
            });
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        check_version(&conn)?;
        Ok(Self {
            conn,
            weights: SearchWeights::default(),
        })
    }

    fn init(conn: Connection) -> IndexResult<Self> {
        check_version(&conn)?;
        create_schema(&conn)?;
        Ok(Self {
            conn,
            weights: SearchWeights::default(),
        })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Starts a write transaction with `BEGIN IMMEDIATE`.
    ///
    /// Taking the write lock up front means a second writer waits on the
    /// busy timeout here instead of failing halfway through a batch.
    pub fn transaction(&mut self) -> IndexResult<Transaction<'_>> {
        Transaction::begin(&self.conn)
    }

    /// Rebuilds the search index from the stored note rows.
    pub fn rebuild_search_index(&mut self) -> IndexResult<()> {
        let tx = self.transaction()?;
        rebuild_fts(tx.conn())?;
        tx.commit()?;
        log::info!("search index rebuilt");
        Ok(())
    }

    /// Whether the search index agrees with the stored note rows.
    pub fn check_search_index(&self) -> IndexResult<bool> {
        Ok(check_fts(&self.conn)?)
    }
}

fn check_version(conn: &Connection) -> IndexResult<()> {
    match get_schema_version(conn)? {
        Some(found) if found > SCHEMA_VERSION => Err(IndexError::UnsupportedSchema {
            found,
            supported: SCHEMA_VERSION,
        }),
        _ => Ok(()),
    }
}
