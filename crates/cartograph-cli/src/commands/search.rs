//! `cartograph search` (§4.6).

use clap::Args;

use cartograph_core::error::Result;
use cartograph_memory::{search_hybrid, search_keyword, search_vector, Store, DEFAULT_LIMIT};

use crate::embedder::embedder;

#[derive(Args)]
pub struct SearchArgs {
    /// Query text
    pub query: String,

    /// Vector-only search (default is hybrid)
    #[arg(long, conflicts_with = "keyword")]
    pub vector: bool,

    /// Keyword-only (BM25) search (default is hybrid)
    #[arg(long)]
    pub keyword: bool,

    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    pub limit: usize,

    #[arg(long)]
    pub json: bool,
}

pub async fn run(store: &Store, args: SearchArgs) -> Result<()> {
    let results = if args.vector {
        search_vector(store, embedder(), &args.query, args.limit).await?
    } else if args.keyword {
        search_keyword(store, &args.query, args.limit)?
    } else {
        search_hybrid(store, embedder(), &args.query, args.limit).await?
    };

    if args.json {
        let json: Vec<_> = results
            .iter()
            .map(|r| {
                serde_json::json!({
                    "id": r.chunk_id,
                    "text": r.text,
                    "path": r.path,
                    "source": r.source,
                    "score": r.score,
                    "start_line": r.start_line,
                    "end_line": r.end_line,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else if results.is_empty() {
        println!("no results");
    } else {
        for r in &results {
            println!(
                "{:.3}  {}:{}-{}  [{}]\n    {}",
                r.score,
                r.path,
                r.start_line,
                r.end_line,
                r.source,
                r.text.lines().next().unwrap_or("")
            );
        }
    }

    Ok(())
}
