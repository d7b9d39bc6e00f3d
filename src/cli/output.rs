//! Output format types for CLI commands.

use clap::ValueEnum;
use serde::Serialize;

use crate::domain::Rel;
use crate::index::{Backlink, IndexedNote, SearchResult};

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output for programmatic consumption
    Json,
    /// Plain file paths, one per line
    Paths,
}

/// Wrapper for serializable command output.
#[derive(Debug, Serialize)]
pub struct Output<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> Output<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }

    pub fn print(&self) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(self)?);
        Ok(())
    }
}

/// A single note in listing output.
#[derive(Debug, Serialize)]
pub struct NoteListing {
    pub id: String,
    pub title: String,
    pub path: String,
}

impl From<&IndexedNote> for NoteListing {
    fn from(note: &IndexedNote) -> Self {
        Self {
            id: note.id().to_string(),
            title: note.title().to_string(),
            path: note.path().to_string_lossy().into_owned(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchListing {
    #[serde(flatten)]
    pub note: NoteListing,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl From<&SearchResult> for SearchListing {
    fn from(result: &SearchResult) -> Self {
        Self {
            note: NoteListing::from(&result.note),
            score: result.score,
            snippet: result.snippet.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BacklinkListing {
    #[serde(flatten)]
    pub note: NoteListing,
    pub rels: Vec<Rel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl From<&Backlink> for BacklinkListing {
    fn from(backlink: &Backlink) -> Self {
        Self {
            note: NoteListing::from(&backlink.source),
            rels: backlink.rels.clone(),
            context: backlink.context.clone(),
        }
    }
}

/// Full note for `show`, body included.
#[derive(Debug, Serialize)]
pub struct NoteDetail<'a> {
    #[serde(flatten)]
    pub note: &'a IndexedNote,
    pub body: &'a str,
}

/// A topic with optional counts.
#[derive(Debug, Serialize)]
pub struct TopicListing {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
}

/// A tag or relationship type with optional count.
#[derive(Debug, Serialize)]
pub struct NameListing {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}
