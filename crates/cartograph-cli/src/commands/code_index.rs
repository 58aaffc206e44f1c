//! `cartograph code-index` (§4.5).

use clap::Args;
use std::path::PathBuf;

use cartograph_core::error::Result;
use cartograph_memory::{index_codebase, Store};

#[derive(Args)]
pub struct CodeIndexArgs {
    pub path: PathBuf,
}

pub fn run(store: &mut Store, args: CodeIndexArgs) -> Result<()> {
    let stats = index_codebase(store, &args.path)?;
    println!(
        "indexed {} files, skipped {}, {} nodes created",
        stats.files_indexed, stats.files_skipped, stats.nodes_created
    );
    Ok(())
}
