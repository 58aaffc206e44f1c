//! `cartograph code-tree` — render the indexed code tree (§6).

use clap::Args;

use cartograph_core::error::Result;
use cartograph_memory::{CodeNodeRow, Store};

#[derive(Args)]
pub struct CodeTreeArgs {
    /// Restrict to this repo path
    pub path: Option<String>,

    #[arg(long)]
    pub json: bool,
}

pub fn run(store: &Store, args: CodeTreeArgs) -> Result<()> {
    let roots = store.get_roots(args.path.as_deref())?;

    if args.json {
        let json = build_json_forest(store, &roots)?;
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        for root in &roots {
            print_node(store, root, 0)?;
        }
    }

    Ok(())
}

fn print_node(store: &Store, node: &CodeNodeRow, indent: usize) -> Result<()> {
    println!(
        "{}{} {} ({}:{}-{})",
        "  ".repeat(indent),
        node.kind,
        node.name,
        node.file_path,
        node.start_line,
        node.end_line
    );
    for child in store.get_children(node.id)? {
        print_node(store, &child, indent + 1)?;
    }
    Ok(())
}

fn build_json_forest(store: &Store, nodes: &[CodeNodeRow]) -> Result<Vec<serde_json::Value>> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        let children = store.get_children(node.id)?;
        let child_json = build_json_forest(store, &children)?;
        out.push(serde_json::json!({
            "id": node.id,
            "kind": node.kind,
            "name": node.name,
            "qualified_name": node.qualified_name,
            "file_path": node.file_path,
            "start_line": node.start_line,
            "end_line": node.end_line,
            "children": child_json,
        }));
    }
    Ok(out)
}
