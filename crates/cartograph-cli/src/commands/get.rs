//! `cartograph get` — lookup a chunk by full id (§6).

use clap::Args;

use cartograph_core::error::Result;
use cartograph_memory::{get_memory, Store};

#[derive(Args)]
pub struct GetArgs {
    pub id: String,

    #[arg(long)]
    pub json: bool,
}

pub fn run(store: &Store, args: GetArgs) -> Result<()> {
    let chunk = get_memory(store, &args.id)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&chunk)?);
    } else {
        println!("id:     {}", chunk.id);
        println!("path:   {}", chunk.path);
        println!("source: {}", chunk.source);
        println!("lines:  {}-{}", chunk.start_line, chunk.end_line);
        println!("---");
        println!("{}", chunk.text);
    }

    Ok(())
}
