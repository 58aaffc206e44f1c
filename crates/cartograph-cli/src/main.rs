//! cartograph - local-first hybrid search and code navigation engine.
//!
//! Thin command-line front end over `cartograph-memory`. Owns process setup
//! (logging, config, store lifetime) and argument parsing only; every
//! operation it performs is a direct call into the core.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod embedder;

use cartograph_core::paths::resolve_db_path;
use cartograph_memory::Store;

#[derive(Parser)]
#[command(name = "cartograph")]
#[command(author, version, about = "Local-first hybrid search and code navigation", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Hybrid / keyword / vector search over indexed notes
    Search(commands::search::SearchArgs),

    /// Index Markdown notes matching the configured scan patterns
    Index(commands::index::IndexArgs),

    /// Show index counts, last-indexed time, db path and size
    Status(commands::status::StatusArgs),

    /// Add a chunk of text directly, bypassing the note indexer
    Add(commands::add::AddArgs),

    /// Look up a chunk by its full id
    Get(commands::get::GetArgs),

    /// Enumerate indexed chunks
    List(commands::list::ListArgs),

    /// Walk and parse a source tree into the code index
    CodeIndex(commands::code_index::CodeIndexArgs),

    /// Beam-search navigate the code tree for a query
    CodeNav(commands::code_nav::CodeNavArgs),

    /// Render the indexed code tree
    CodeTree(commands::code_tree::CodeTreeArgs),

    /// Show the cross-references recorded for a code node
    CodeRefs(commands::code_refs::CodeRefsArgs),

    /// Regenerate fallback summaries for every code node
    CodeSummarize(commands::code_summarize::CodeSummarizeArgs),
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();

    let cli = Cli::parse();
    let exit_code = run(cli).await;
    std::process::exit(exit_code);
}

async fn run(cli: Cli) -> i32 {
    let db_path = resolve_db_path();
    let mut store = match Store::open(&db_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("failed to open store at {:?}: {}", db_path, e.with_context());
            return 1;
        }
    };

    let result = match cli.command {
        Commands::Search(args) => commands::search::run(&store, args).await,
        Commands::Index(args) => commands::index::run(&mut store, args).await,
        Commands::Status(args) => commands::status::run(&store, args),
        Commands::Add(args) => commands::add::run(&mut store, args),
        Commands::Get(args) => commands::get::run(&store, args),
        Commands::List(args) => commands::list::run(&store, args),
        Commands::CodeIndex(args) => commands::code_index::run(&mut store, args),
        Commands::CodeNav(args) => commands::code_nav::run(&store, args),
        Commands::CodeTree(args) => commands::code_tree::run(&store, args),
        Commands::CodeRefs(args) => commands::code_refs::run(&store, args),
        Commands::CodeSummarize(args) => commands::code_summarize::run(&mut store, args),
    };

    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{}", e.with_context());
            1
        }
    }
}
