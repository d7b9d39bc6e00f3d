//! Note resolution utilities.

use anyhow::{Context, Result, bail};

use crate::index::{IndexRepository, IndexedNote};

/// Result of resolving a note identifier.
#[derive(Debug)]
pub enum ResolveResult {
    /// Exactly one note matched.
    Unique(IndexedNote),
    /// Multiple notes matched (ambiguous).
    Ambiguous(Vec<IndexedNote>),
    /// No notes matched.
    NotFound,
}

impl ResolveResult {
    /// The unique note, or an error after explaining the ambiguity.
    pub fn into_unique(self, identifier: &str) -> Result<IndexedNote> {
        match self {
            ResolveResult::Unique(note) => Ok(note),
            ResolveResult::Ambiguous(notes) => {
                print_ambiguous_notes(identifier, &notes);
                bail!("ambiguous note identifier");
            }
            ResolveResult::NotFound => bail!("note not found: {}", identifier),
        }
    }
}

fn print_ambiguous_notes(identifier: &str, notes: &[IndexedNote]) {
    eprintln!("Ambiguous: '{}' matches {} notes:", identifier, notes.len());
    for indexed in notes {
        let note = indexed.note();
        eprintln!("  {} - {}", note.id().prefix(), note.title());

        if let Some(desc) = note.description() {
            eprintln!("      {}", desc);
        }
        if !note.aliases().is_empty() {
            eprintln!("      aliases: {}", note.aliases().join(", "));
        }
        if !note.tags().is_empty() {
            let tags: Vec<_> = note.tags().iter().map(|t| t.as_str()).collect();
            eprintln!("      tags: {}", tags.join(", "));
        }
    }
    eprintln!();
    eprintln!("Use the ID prefix to specify which note you mean.");
}

/// Resolves a note identifier to a unique note.
///
/// Resolution order:
/// 1. ID prefix match (if input looks like a ULID prefix)
/// 2. Exact title match
/// 3. Alias match
///
/// A single ID match wins outright; otherwise candidates from all three are
/// pooled and deduplicated.
pub fn resolve_note<R: IndexRepository>(index: &R, identifier: &str) -> Result<ResolveResult> {
    let identifier = identifier.trim();

    let looks_like_id =
        identifier.len() >= 4 && identifier.chars().all(|c| c.is_ascii_alphanumeric());

    let mut candidates: Vec<IndexedNote> = Vec::new();

    if looks_like_id {
        let mut id_matches = index
            .find_by_id_prefix(identifier)
            .with_context(|| "failed to search by ID prefix")?;

        if id_matches.len() == 1
            && let Some(note) = id_matches.pop()
        {
            return Ok(ResolveResult::Unique(note));
        }

        candidates.extend(id_matches);
    }

    candidates.extend(
        index
            .find_by_title(identifier)
            .with_context(|| "failed to search by title")?,
    );
    candidates.extend(
        index
            .find_by_alias(identifier)
            .with_context(|| "failed to search by alias")?,
    );

    candidates.sort_by(|a, b| a.id().cmp(b.id()));
    candidates.dedup_by(|a, b| a.id() == b.id());

    match candidates.len() {
        0 => Ok(ResolveResult::NotFound),
        1 => Ok(candidates
            .pop()
            .map_or(ResolveResult::NotFound, ResolveResult::Unique)),
        _ => Ok(ResolveResult::Ambiguous(candidates)),
    }
}
