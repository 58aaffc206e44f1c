//! `cartograph status` — counts, last-indexed timestamp, db path and size (§6).

use clap::Args;

use cartograph_core::error::Result;
use cartograph_memory::Store;

#[derive(Args)]
pub struct StatusArgs {
    #[arg(long)]
    pub json: bool,
}

pub fn run(store: &Store, args: StatusArgs) -> Result<()> {
    let stats = store.stats()?;
    let last_indexed = store.meta_get("last_indexed_at")?.unwrap_or_else(|| "never".to_string());

    if args.json {
        let json = serde_json::json!({
            "chunk_count": stats.chunk_count,
            "code_node_count": stats.code_node_count,
            "file_count": stats.file_count,
            "code_file_count": stats.code_file_count,
            "db_path": stats.db_path,
            "db_size_bytes": stats.db_size_bytes,
            "vector_capable": stats.vector_capable,
            "last_indexed_at": last_indexed,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        println!("db path:        {}", stats.db_path);
        println!("db size:        {} bytes", stats.db_size_bytes);
        println!("chunks:         {}", stats.chunk_count);
        println!("note files:     {}", stats.file_count);
        println!("code nodes:     {}", stats.code_node_count);
        println!("code files:     {}", stats.code_file_count);
        println!("vector search:  {}", if stats.vector_capable { "enabled" } else { "disabled" });
        println!("last indexed:   {}", last_indexed);
    }

    Ok(())
}
