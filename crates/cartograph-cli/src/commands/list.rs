//! `cartograph list` — enumerate indexed chunks (§6).

use clap::Args;

use cartograph_core::error::Result;
use cartograph_memory::{list_memories, Store};

#[derive(Args)]
pub struct ListArgs {
    #[arg(long)]
    pub source: Option<String>,

    #[arg(long, default_value_t = 50)]
    pub limit: usize,

    #[arg(long)]
    pub json: bool,
}

pub fn run(store: &Store, args: ListArgs) -> Result<()> {
    let chunks = list_memories(store, args.source.as_deref(), args.limit)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&chunks)?);
    } else if chunks.is_empty() {
        println!("no chunks indexed");
    } else {
        for c in &chunks {
            println!("{}  {}  [{}]  {}-{}", c.id, c.path, c.source, c.start_line, c.end_line);
        }
    }

    Ok(())
}
