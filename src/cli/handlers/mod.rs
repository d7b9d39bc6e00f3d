//! Command handlers for the CLI.

mod check;
mod filter;
mod index;
mod links;
mod list;
mod metadata;
mod resolve;
mod search;
mod show;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::cli::config::Config;
use crate::index::{FileResult, IndexedNote, ProgressReporter, SearchWeights, SqliteIndex};

pub use check::handle_check;
pub use index::handle_index;
pub use links::handle_backlinks;
pub use list::handle_list;
pub use metadata::{handle_rels, handle_tags, handle_topics};
pub use resolve::{ResolveResult, resolve_note};
pub use search::handle_search;
pub use show::handle_show;

/// Where a command finds notes and the index.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub notes_dir: PathBuf,
    pub index_path: PathBuf,
    pub weights: SearchWeights,
}

impl Workspace {
    pub fn new(config: &Config, cli_dir: Option<&PathBuf>) -> Self {
        let notes_dir = config.notes_dir(cli_dir);
        Self {
            index_path: config.index_path(&notes_dir),
            notes_dir,
            weights: config.search,
        }
    }

    /// Opens the index for writing, creating it when absent.
    pub(crate) fn open_index(&self) -> Result<SqliteIndex> {
        let index = SqliteIndex::open(&self.index_path)
            .with_context(|| format!("failed to open index at {}", self.index_path.display()))?;
        Ok(index.with_search_weights(self.weights))
    }

    /// Opens an existing index for queries.
    pub(crate) fn open_index_read_only(&self) -> Result<SqliteIndex> {
        let index = SqliteIndex::open_read_only(&self.index_path).with_context(|| {
            format!(
                "failed to open index at {} (run `notedex index` first)",
                self.index_path.display()
            )
        })?;
        Ok(index.with_search_weights(self.weights))
    }
}

/// Progress reporter that prints to stdout.
pub(crate) struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    pub(crate) fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ProgressReporter for ConsoleReporter {
    fn on_file(&mut self, path: &Path, result: FileResult) {
        if self.verbose {
            match result {
                FileResult::Indexed => println!("  indexed: {}", path.display()),
                FileResult::Skipped => println!("  unchanged: {}", path.display()),
                FileResult::Removed => println!("  removed: {}", path.display()),
                FileResult::Error(msg) => eprintln!("  error: {}", msg),
            }
        }
    }

    fn on_complete(&mut self, indexed: usize, errors: usize) {
        if errors > 0 {
            eprintln!("Indexed {} notes with {} errors", indexed, errors);
        } else {
            println!("Indexed {} notes", indexed);
        }
    }
}

/// Truncates a string to a maximum display width, adding ellipsis if needed.
pub(crate) fn truncate_str(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
        format!("{}…", truncated)
    }
}

/// Prints the ID / Title / Modified table shared by listing commands.
pub(crate) fn print_note_table<'a>(
    notes: impl ExactSizeIterator<Item = &'a IndexedNote>,
    noun: &str,
) {
    let total = notes.len();
    println!("{:<10}  {:<50}  {:>10}", "ID", "Title", "Modified");
    println!("{:<10}  {:<50}  {:>10}", "-".repeat(10), "-".repeat(50), "-".repeat(10));
    for note in notes {
        let modified = note.note().modified().format("%Y-%m-%d").to_string();
        println!(
            "{:<10}  {:<50}  {:>10}",
            note.id().prefix(),
            truncate_str(note.title(), 50),
            modified
        );
    }
    println!();
    println!("{} {}(s)", total, noun);
}
