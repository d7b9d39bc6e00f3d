//! Index command handler.

use anyhow::{Context, Result};

use super::{ConsoleReporter, Workspace};
use crate::cli::IndexArgs;
use crate::index::{IndexBuilder, IndexRepository};

pub fn handle_index(args: &IndexArgs, ws: &Workspace, verbose: bool) -> Result<()> {
    let mut index = ws.open_index()?;
    let builder = IndexBuilder::new(&ws.notes_dir);
    let mut reporter = ConsoleReporter::new(verbose);

    let built = index
        .index_state()
        .with_context(|| "failed to read index state")?
        .is_built();

    if args.full || !built {
        println!("Rebuilding index...");
        let report = builder
            .full_rebuild_with_progress(&mut index, &mut reporter)
            .with_context(|| "failed to rebuild index")?;

        for error in &report.errors {
            eprintln!("  {}", error);
        }
    } else {
        println!("Updating index...");
        let report = builder
            .incremental_update_with_progress(&mut index, &mut reporter)
            .with_context(|| "failed to update index")?;

        if verbose || report.added > 0 || report.modified > 0 || report.removed > 0 {
            println!(
                "  {} added, {} modified, {} removed, {} unchanged",
                report.added, report.modified, report.removed, report.unchanged
            );
        }

        for error in &report.errors {
            eprintln!("  {}", error);
        }
    }

    Ok(())
}
