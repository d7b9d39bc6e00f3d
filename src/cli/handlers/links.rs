//! Backlinks command handler.

use anyhow::{Context, Result};

use super::resolve::resolve_note;
use super::{Workspace, truncate_str};
use crate::cli::BacklinksArgs;
use crate::cli::output::{BacklinkListing, Output, OutputFormat};
use crate::domain::Rel;
use crate::index::IndexRepository;

pub fn handle_backlinks(args: &BacklinksArgs, ws: &Workspace) -> Result<()> {
    let rel = args
        .rel
        .as_deref()
        .map(|r| Rel::new(r).with_context(|| format!("invalid relationship type '{}'", r)))
        .transpose()?;

    let index = ws.open_index_read_only()?;
    let target = resolve_note(&index, &args.note)?.into_unique(&args.note)?;

    let backlinks = index
        .backlinks(target.id(), rel.as_ref())
        .with_context(|| "failed to query backlinks")?;

    match args.format {
        OutputFormat::Human => {
            if backlinks.is_empty() {
                println!("No backlinks found.");
                return Ok(());
            }
            println!("{:<10}  {:<40}  {}", "ID", "Title", "Rels");
            println!("{:<10}  {:<40}  {}", "-".repeat(10), "-".repeat(40), "-".repeat(10));
            for backlink in &backlinks {
                let rels: Vec<_> = backlink.rels.iter().map(Rel::as_str).collect();
                println!(
                    "{:<10}  {:<40}  {}",
                    backlink.source.id().prefix(),
                    truncate_str(backlink.source.title(), 40),
                    rels.join(", ")
                );
                if let Some(context) = &backlink.context {
                    println!("{:<10}  {}", "", context);
                }
            }
            println!();
            println!("{} backlink(s)", backlinks.len());
        }
        OutputFormat::Json => {
            let listings: Vec<BacklinkListing> =
                backlinks.iter().map(BacklinkListing::from).collect();
            Output::new(listings).print()?;
        }
        OutputFormat::Paths => {
            for backlink in &backlinks {
                println!("{}", ws.notes_dir.join(backlink.source.path()).display());
            }
        }
    }
    Ok(())
}
