//! CLI command definitions and handlers

pub mod config;
pub mod date_filter;
pub mod handlers;
pub mod output;

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use date_filter::DateFilter;
use output::OutputFormat;

/// notedex - a queryable index over a directory of markdown notes
#[derive(Parser, Debug)]
#[command(name = "notedex", version, about, long_about = None)]
pub struct Cli {
    /// Notes directory (overrides config file)
    #[arg(short = 'd', long, global = true)]
    pub dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rebuild or update the index
    Index(IndexArgs),

    /// List notes, optionally filtered by topic, tags and dates
    #[command(name = "ls")]
    List(ListArgs),

    /// Full-text search across notes
    Search(SearchArgs),

    /// Show a note's metadata and body
    Show(ShowArgs),

    /// List all topics in the hierarchy
    Topics(TopicsArgs),

    /// List all tags
    Tags(TagsArgs),

    /// List relationship types used in links
    Rels(RelsArgs),

    /// Show notes that link to a given note
    Backlinks(BacklinksArgs),

    /// Check the index for broken links, orphans and duplicate ids
    Check(CheckArgs),
}

#[derive(Parser, Debug)]
pub struct IndexArgs {
    /// Force full rebuild instead of incremental update
    #[arg(long)]
    pub full: bool,
}

#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Topic to filter by (trailing / includes descendants)
    pub topic: Option<String>,

    /// Filter by tag (can be specified multiple times; all must match)
    #[arg(short, long = "tag", action = ArgAction::Append)]
    pub tags: Vec<String>,

    /// Only notes created on or after DATE (YYYY-MM-DD or Nd for N days ago)
    #[arg(long, value_name = "DATE")]
    pub created: Option<DateFilter>,

    /// Only notes modified on or after DATE (YYYY-MM-DD or Nd for N days ago)
    #[arg(long, value_name = "DATE")]
    pub modified: Option<DateFilter>,

    /// Include notes tagged 'archived'
    #[arg(short = 'a', long)]
    pub include_archived: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct SearchArgs {
    /// Search query (FTS5 syntax)
    pub query: String,

    /// Restrict to a topic (trailing / includes descendants)
    #[arg(short = 'T', long)]
    pub topic: Option<String>,

    /// Filter by tag (can be specified multiple times; all must match)
    #[arg(short, long = "tag", action = ArgAction::Append)]
    pub tags: Vec<String>,

    /// Include notes tagged 'archived'
    #[arg(short = 'a', long)]
    pub include_archived: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Note ID prefix, title or alias
    pub note: String,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct TopicsArgs {
    /// Show note counts for each topic
    #[arg(long)]
    pub counts: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct TagsArgs {
    /// Show note counts for each tag
    #[arg(long)]
    pub counts: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct RelsArgs {
    /// Show usage counts for each relationship type
    #[arg(long)]
    pub counts: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct BacklinksArgs {
    /// Note ID prefix, title or alias
    pub note: String,

    /// Filter by relationship type
    #[arg(long)]
    pub rel: Option<String>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Remove dangling links and rebuild a drifted search index
    #[arg(long)]
    pub fix: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn ls_accepts_repeated_tags() {
        let cli = Cli::parse_from(["notedex", "ls", "software/", "-t", "rust", "--tag", "draft"]);
        match cli.command {
            Command::List(args) => {
                assert_eq!(args.topic.as_deref(), Some("software/"));
                assert_eq!(args.tags, vec!["rust", "draft"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn ls_parses_date_filters_and_archive_flag() {
        let cli = Cli::parse_from(["notedex", "ls", "--created", "2024-01-15", "--modified", "7d", "-a"]);
        match cli.command {
            Command::List(args) => {
                assert_eq!(args.created, Some("2024-01-15".parse().unwrap()));
                assert!(args.modified.is_some());
                assert!(args.include_archived);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn ls_rejects_malformed_date() {
        assert!(Cli::try_parse_from(["notedex", "ls", "--created", "yesterday"]).is_err());
    }

    #[test]
    fn search_accepts_topic_tags_and_archive_flag() {
        let cli = Cli::parse_from(["notedex", "search", "rust", "-T", "software/", "-t", "draft", "--include-archived"]);
        match cli.command {
            Command::Search(args) => {
                assert_eq!(args.query, "rust");
                assert_eq!(args.topic.as_deref(), Some("software/"));
                assert_eq!(args.tags, vec!["draft"]);
                assert!(args.include_archived);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::parse_from(["notedex", "index", "--full", "-vv", "--dir", "/tmp/notes"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.dir, Some(PathBuf::from("/tmp/notes")));
        assert!(matches!(cli.command, Command::Index(IndexArgs { full: true })));
    }
}
