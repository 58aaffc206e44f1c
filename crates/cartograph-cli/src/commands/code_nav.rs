//! `cartograph code-nav` (§4.7).

use clap::Args;

use cartograph_core::error::Result;
use cartograph_memory::{navigate, Store};

#[derive(Args)]
pub struct CodeNavArgs {
    pub query: String,

    #[arg(long)]
    pub repo: Option<String>,

    #[arg(long)]
    pub json: bool,
}

pub fn run(store: &Store, args: CodeNavArgs) -> Result<()> {
    let result = navigate(store, &args.query, args.repo.as_deref())?;

    if args.json {
        let json = serde_json::json!({
            "nodes": result.nodes,
            "steps": result.steps,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        for step in &result.steps {
            println!(
                "depth {}: considered [{}] selected [{}]",
                step.depth,
                step.candidates.join(", "),
                step.selected.join(", ")
            );
        }
        println!();
        for node in &result.nodes {
            println!(
                "{} {} — {}:{}-{}",
                node.kind, node.qualified_name, node.file_path, node.start_line, node.end_line
            );
            if let Some(sig) = &node.signature {
                println!("    {}", sig);
            }
            if let Some(doc) = &node.docstring {
                println!("    \"{}\"", doc);
            }
        }
    }

    Ok(())
}
