//! `cartograph index` (§4.3).

use clap::Args;

use cartograph_core::error::Result;
use cartograph_core::paths::default_scan_patterns;
use cartograph_memory::{index_all, Store};

use crate::embedder::embedder;

#[derive(Args)]
pub struct IndexArgs {
    /// Index this single path/glob instead of the default scan patterns
    #[arg(long)]
    pub path: Option<String>,
}

pub async fn run(store: &mut Store, args: IndexArgs) -> Result<()> {
    let patterns = match args.path {
        Some(p) => vec![p],
        None => default_scan_patterns(),
    };

    let stats = index_all(store, embedder(), &patterns).await?;
    println!(
        "indexed {} files, skipped {}, {} chunks created",
        stats.indexed, stats.skipped, stats.chunks_created
    );
    Ok(())
}
