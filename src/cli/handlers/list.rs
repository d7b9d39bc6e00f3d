//! List command handler.

use anyhow::{Context, Result};

use super::Workspace;
use super::filter::NoteFilter;
use super::print_note_table;
use crate::cli::ListArgs;
use crate::cli::output::{NoteListing, Output, OutputFormat};
use crate::index::{IndexRepository, IndexedNote};

pub fn handle_list(args: &ListArgs, ws: &Workspace) -> Result<()> {
    let filter = NoteFilter::new(args.topic.as_deref(), &args.tags, args.include_archived)?
        .created(args.created)
        .modified(args.modified);
    let index = ws.open_index_read_only()?;

    let mut notes: Vec<IndexedNote> = match filter.narrow(&index)? {
        Some(notes) => notes,
        None => index
            .list_all()
            .with_context(|| "failed to list all notes")?,
    };
    notes.retain(|n| filter.keeps(n.note()));

    match args.format {
        OutputFormat::Human => {
            if notes.is_empty() {
                println!("No notes found.");
            } else {
                print_note_table(notes.iter(), "note");
            }
        }
        OutputFormat::Json => {
            let listings: Vec<NoteListing> = notes.iter().map(NoteListing::from).collect();
            Output::new(listings).print()?;
        }
        OutputFormat::Paths => {
            for note in &notes {
                println!("{}", ws.notes_dir.join(note.path()).display());
            }
        }
    }

    Ok(())
}
