//! Check command handler.

use anyhow::{Context, Result, bail};

use super::Workspace;
use crate::cli::CheckArgs;
use crate::cli::output::{Output, OutputFormat};
use crate::index::{IndexRepository, IntegrityReport};

pub fn handle_check(args: &CheckArgs, ws: &Workspace) -> Result<()> {
    // The search-index consistency check writes to the FTS control row.
    let mut index = ws.open_index()?;

    let mut report = index
        .integrity_check()
        .with_context(|| "failed to check index")?;

    if args.fix {
        let removed = index
            .repair_dangling_links()
            .with_context(|| "failed to remove dangling links")?;
        if removed > 0 {
            println!("Removed {} dangling link(s)", removed);
        }
        if !report.search_index_consistent {
            index
                .rebuild_search_index()
                .with_context(|| "failed to rebuild search index")?;
            println!("Rebuilt search index");
        }
        report = index
            .integrity_check()
            .with_context(|| "failed to check index")?;
    }

    match args.format {
        OutputFormat::Json => Output::new(&report).print()?,
        OutputFormat::Human | OutputFormat::Paths => print_report(&report),
    }

    if report.error_count() > 0 || !report.search_index_consistent {
        bail!("check failed");
    }
    Ok(())
}

fn print_report(report: &IntegrityReport) {
    if report.is_clean() {
        println!("All notes OK.");
        return;
    }

    let mut issues: Vec<_> = report.issues.iter().collect();
    issues.sort_by_key(|i| std::cmp::Reverse(i.severity()));
    for issue in issues {
        println!("{}: {}", issue.severity(), issue);
    }
    if !report.search_index_consistent {
        println!("error: search index is out of date (run `notedex check --fix`)");
    }
    println!(
        "\nFound {} issue(s): {} error(s), {} warning(s)",
        report.issues.len(),
        report.error_count(),
        report.warning_count()
    );
}
