//! notedex - a derived SQLite index over a directory of markdown notes

pub mod cli;
pub mod domain;
pub mod index;
pub mod infra;

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use cli::{
    Cli, Command,
    config::Config,
    handlers::{
        Workspace, handle_backlinks, handle_check, handle_index, handle_list, handle_rels,
        handle_search, handle_show, handle_tags, handle_topics,
    },
};

/// Main entry point for the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load()?;
    let ws = Workspace::new(&config, cli.dir.as_ref());
    log::debug!(
        "notes dir {}, index {}",
        ws.notes_dir.display(),
        ws.index_path.display()
    );

    match &cli.command {
        Command::Index(args) => handle_index(args, &ws, cli.verbose > 0),
        Command::List(args) => handle_list(args, &ws),
        Command::Search(args) => handle_search(args, &ws),
        Command::Show(args) => handle_show(args, &ws),
        Command::Topics(args) => handle_topics(args, &ws),
        Command::Tags(args) => handle_tags(args, &ws),
        Command::Rels(args) => handle_rels(args, &ws),
        Command::Backlinks(args) => handle_backlinks(args, &ws),
        Command::Check(args) => handle_check(args, &ws),
    }
}

/// `-v` steps the default level up from `warn`; `RUST_LOG` wins when set.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .try_init();
}
