//! `cartograph code-refs` (§3 CodeRef).

use clap::Args;

use cartograph_core::error::{CoreError, Result};
use cartograph_memory::Store;

#[derive(Args)]
pub struct CodeRefsArgs {
    pub node_id: i64,

    #[arg(long)]
    pub json: bool,
}

pub fn run(store: &Store, args: CodeRefsArgs) -> Result<()> {
    if store.get_node(args.node_id)?.is_none() {
        return Err(CoreError::not_found(format!("code node {}", args.node_id)));
    }

    let refs = store.refs_for_node(args.node_id)?;
    for r in &refs {
        if r.target_id.is_none() {
            store.resolve_ref(r.id)?;
        }
    }
    let refs = store.refs_for_node(args.node_id)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&refs)?);
    } else if refs.is_empty() {
        println!("no refs recorded");
    } else {
        for r in &refs {
            let target = match r.target_id {
                Some(id) => id.to_string(),
                None => "unresolved".to_string(),
            };
            println!("{}  {}  -> {}  (line {})", r.kind, r.target_name, target, r.line);
        }
    }

    Ok(())
}
