//! Show command handler.

use anyhow::Result;

use super::Workspace;
use super::resolve::resolve_note;
use crate::cli::ShowArgs;
use crate::cli::output::{NoteDetail, Output, OutputFormat};

pub fn handle_show(args: &ShowArgs, ws: &Workspace) -> Result<()> {
    let index = ws.open_index_read_only()?;
    let indexed = resolve_note(&index, &args.note)?.into_unique(&args.note)?;
    let note = indexed.note();

    match args.format {
        OutputFormat::Human => {
            println!("# {}", note.title());
            println!();
            println!("id:       {}", note.id());
            println!("path:     {}", indexed.path().display());
            println!("created:  {}", note.created().format("%Y-%m-%d %H:%M"));
            println!("modified: {}", note.modified().format("%Y-%m-%d %H:%M"));
            if let Some(desc) = note.description() {
                println!("desc:     {}", desc);
            }
            if !note.topics().is_empty() {
                let topics: Vec<_> = note.topics().iter().map(|t| t.as_str()).collect();
                println!("topics:   {}", topics.join(", "));
            }
            if !note.tags().is_empty() {
                let tags: Vec<_> = note.tags().iter().map(|t| t.as_str()).collect();
                println!("tags:     {}", tags.join(", "));
            }
            if !note.aliases().is_empty() {
                println!("aliases:  {}", note.aliases().join(", "));
            }
            for link in note.links() {
                println!("link:     {}", link);
            }
            if !indexed.body().is_empty() {
                println!();
                print!("{}", indexed.body());
                if !indexed.body().ends_with('\n') {
                    println!();
                }
            }
        }
        OutputFormat::Json => {
            Output::new(NoteDetail {
                note: &indexed,
                body: indexed.body(),
            })
            .print()?;
        }
        OutputFormat::Paths => {
            println!("{}", ws.notes_dir.join(indexed.path()).display());
        }
    }
    Ok(())
}
