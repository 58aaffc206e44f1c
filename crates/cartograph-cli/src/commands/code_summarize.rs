//! `cartograph code-summarize` (§4.8).

use clap::Args;

use cartograph_core::error::Result;
use cartograph_memory::{summarize_all, Store};

#[derive(Args)]
pub struct CodeSummarizeArgs {
    /// Restrict to this repo path
    #[arg(long)]
    pub repo: Option<String>,
}

pub fn run(store: &mut Store, args: CodeSummarizeArgs) -> Result<()> {
    let updated = summarize_all(store, args.repo.as_deref())?;
    println!("summarized {} code nodes", updated);
    Ok(())
}
