//! Search command handler.

use anyhow::{Context, Result};
use std::collections::HashSet;

use super::Workspace;
use super::filter::NoteFilter;
use crate::cli::SearchArgs;
use crate::cli::output::{Output, OutputFormat, SearchListing};
use crate::index::IndexRepository;

pub fn handle_search(args: &SearchArgs, ws: &Workspace) -> Result<()> {
    let filter = NoteFilter::new(args.topic.as_deref(), &args.tags, args.include_archived)?;
    let index = ws.open_index_read_only()?;

    let mut results = index
        .search(&args.query)
        .with_context(|| format!("search failed for query: {}", args.query))?;

    if let Some(allowed) = filter.narrow(&index)? {
        let allowed: HashSet<_> = allowed.iter().map(|n| n.id().clone()).collect();
        results.retain(|r| allowed.contains(r.note.id()));
    }
    results.retain(|r| filter.keeps(r.note.note()));

    match args.format {
        OutputFormat::Human => {
            if results.is_empty() {
                println!("No matching notes found.");
            } else {
                for result in &results {
                    println!(
                        "{} {} (score: {:.2})",
                        result.note.id().prefix(),
                        result.note.title(),
                        result.score
                    );
                    if let Some(snippet) = &result.snippet {
                        println!("  {}", snippet.replace('\n', " "));
                    }
                }
                println!();
                println!("{} result(s)", results.len());
            }
        }
        OutputFormat::Json => {
            let listings: Vec<SearchListing> = results.iter().map(SearchListing::from).collect();
            Output::new(listings).print()?;
        }
        OutputFormat::Paths => {
            for result in &results {
                println!("{}", ws.notes_dir.join(result.note.path()).display());
            }
        }
    }
    Ok(())
}
