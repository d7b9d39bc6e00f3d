//! SQLite-backed notes index.

mod builder_methods;
mod connection;
mod query;
mod repo_impl;
mod transaction;
mod write;


use crate::index::SearchWeights;
use rusqlite::Connection;

pub use transaction::Transaction;

/// The notes index stored in one SQLite database.
///
/// Owns its connection; open one per command and drop it when done.
pub struct SqliteIndex {
    pub(crate) conn: Connection,
    weights: SearchWeights,
}

impl SqliteIndex {
    /// Replaces the search ranking weights.
    pub fn with_search_weights(mut self, weights: SearchWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn search_weights(&self) -> SearchWeights {
        self.weights
    }
}
