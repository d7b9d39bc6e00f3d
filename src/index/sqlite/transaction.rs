//! RAII write transaction.

use crate::index::IndexResult;
use rusqlite::Connection;

/// A write transaction that rolls back when dropped uncommitted.
///
/// Begun with `BEGIN IMMEDIATE`, so the write lock is held from the start.
pub struct Transaction<'a> {
    conn: &'a Connection,
    finished: bool,
}

impl<'a> Transaction<'a> {
    pub(crate) fn begin(conn: &'a Connection) -> IndexResult<Self> {
        conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(Self {
            conn,
            finished: false,
        })
    }

    pub(crate) fn conn(&self) -> &Connection {
        self.conn
    }

    pub fn commit(mut self) -> IndexResult<()> {
        self.conn.execute_batch("COMMIT")?;
        self.finished = true;
        Ok(())
    }

    pub fn rollback(mut self) -> IndexResult<()> {
        self.finished = true;
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.finished
            && let Err(e) = self.conn.execute_batch("ROLLBACK")
        {
            log::warn!("rollback failed: {}", e);
        }
    }
}
