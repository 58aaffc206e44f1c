//! `cartograph add` — direct chunk add, bypassing the note indexer (§6, §9).

use clap::Args;

use cartograph_core::error::Result;
use cartograph_memory::{add_memory, Store};

#[derive(Args)]
pub struct AddArgs {
    /// Chunk text
    pub content: String,

    #[arg(long, default_value = "other")]
    pub source: String,

    #[arg(long, default_value = "")]
    pub tags: String,
}

pub fn run(store: &mut Store, args: AddArgs) -> Result<()> {
    let chunk = add_memory(store, &args.content, &args.source, &args.tags)?;
    println!("{}", chunk.id);
    Ok(())
}
