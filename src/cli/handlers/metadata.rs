//! Metadata command handlers (topics, tags, rels).

use anyhow::{Context, Result};

use super::Workspace;
use crate::cli::output::{NameListing, Output, OutputFormat, TopicListing};
use crate::cli::{RelsArgs, TagsArgs, TopicsArgs};
use crate::index::IndexRepository;

pub fn handle_topics(args: &TopicsArgs, ws: &Workspace) -> Result<()> {
    let index = ws.open_index_read_only()?;
    let topics = index
        .topic_counts()
        .with_context(|| "failed to list topics")?;

    match args.format {
        OutputFormat::Human => {
            if topics.is_empty() {
                println!("No topics found.");
            }
            for t in &topics {
                if args.counts {
                    println!("{} ({}/{})", t.topic, t.exact_count, t.total_count);
                } else {
                    println!("{}", t.topic);
                }
            }
        }
        OutputFormat::Json => {
            let listings: Vec<TopicListing> = topics
                .iter()
                .map(|t| TopicListing {
                    path: t.topic.to_string(),
                    count: args.counts.then_some(t.exact_count),
                    total: args.counts.then_some(t.total_count),
                })
                .collect();
            Output::new(listings).print()?;
        }
        OutputFormat::Paths => {
            for t in &topics {
                println!("{}", t.topic);
            }
        }
    }
    Ok(())
}

pub fn handle_tags(args: &TagsArgs, ws: &Workspace) -> Result<()> {
    let index = ws.open_index_read_only()?;
    let tags = index.tag_counts().with_context(|| "failed to list tags")?;
    let rows: Vec<(String, u32)> = tags.iter().map(|t| (t.tag.to_string(), t.count)).collect();
    print_names(&rows, args.counts, args.format, "No tags found.")
}

pub fn handle_rels(args: &RelsArgs, ws: &Workspace) -> Result<()> {
    let index = ws.open_index_read_only()?;
    let rels = index.rel_counts().with_context(|| "failed to list rels")?;
    let rows: Vec<(String, u32)> = rels.iter().map(|r| (r.rel.to_string(), r.count)).collect();
    print_names(&rows, args.counts, args.format, "No relationship types found.")
}

fn print_names(
    rows: &[(String, u32)],
    counts: bool,
    format: OutputFormat,
    empty: &str,
) -> Result<()> {
    match format {
        OutputFormat::Human => {
            if rows.is_empty() {
                println!("{}", empty);
            }
            for (name, count) in rows {
                if counts {
                    println!("{} ({})", name, count);
                } else {
                    println!("{}", name);
                }
            }
        }
        OutputFormat::Json => {
            let listings: Vec<NameListing> = rows
                .iter()
                .map(|(name, count)| NameListing {
                    name: name.clone(),
                    count: counts.then_some(*count),
                })
                .collect();
            Output::new(listings).print()?;
        }
        OutputFormat::Paths => {
            for (name, _) in rows {
                println!("{}", name);
            }
        }
    }
    Ok(())
}
