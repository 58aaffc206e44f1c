//! Summarizer: deterministic, LLM-free one-line summary per code node (§4.8).

use std::collections::HashMap;
use tracing::{info, instrument};

use cartograph_core::error::Result;

use crate::store::{CodeNodeRow, Store};

fn kind_label(kind: &str) -> &'static str {
    match kind {
        "class" => "Class",
        "function" => "Function",
        "interface" => "Interface",
        "type_alias" => "Type",
        "import" => "Import",
        _ => "Node",
    }
}

/// Builds one node's summary given its row and its already-summarized children
/// (child_name, start_line) pairs in source order.
fn summarize_node(node: &CodeNodeRow, children: &[(String, u32)]) -> String {
    let mut summary = format!("{} {}", kind_label(&node.kind), node.name);

    if let Some(doc) = node.docstring.as_deref().filter(|d| !d.trim().is_empty()) {
        let first_sentence = doc.split('.').next().unwrap_or(doc).trim();
        summary.push_str(" - ");
        summary.push_str(first_sentence);
    } else if let Some(sig) = node.signature.as_deref() {
        if sig != node.name {
            summary.push_str(&format!(" ({})", sig));
        }
    }

    if !children.is_empty() {
        let mut ordered = children.to_vec();
        ordered.sort_by_key(|(_, line)| *line);
        let names: Vec<&str> = ordered.iter().map(|(name, _)| name.as_str()).collect();
        summary.push_str(&format!(". Contains: {}", names.join(", ")));
    }

    summary
}

/// Regenerates every node's summary, leaves first, then rebuilds the code-FTS
/// index so the new summary text becomes searchable. Commits once at the end.
#[instrument(skip(store))]
pub fn summarize_all(store: &mut Store, repo_path: Option<&str>) -> Result<usize> {
    let nodes = store.nodes_by_depth_desc(repo_path)?;
    let mut children_by_parent: HashMap<i64, Vec<(String, u32)>> = HashMap::new();
    let mut updated = 0usize;

    for node in &nodes {
        let children = children_by_parent.remove(&node.id).unwrap_or_default();
        let summary = summarize_node(node, &children);
        store.update_summary(node.id, &summary)?;
        updated += 1;

        if let Some(parent_id) = node.parent_id {
            children_by_parent
                .entry(parent_id)
                .or_default()
                .push((node.name.clone(), node.start_line));
        }
    }

    store.rebuild_code_fts()?;
    info!("summarized {} code nodes", updated);
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CodeKind, CodeNodeDraft};

    fn draft(
        kind: CodeKind,
        name: &str,
        qualified: &str,
        signature: Option<&str>,
        docstring: Option<&str>,
        start_line: u32,
        children: Vec<CodeNodeDraft>,
    ) -> CodeNodeDraft {
        CodeNodeDraft {
            kind,
            name: name.to_string(),
            qualified_name: qualified.to_string(),
            start_line,
            end_line: start_line + 1,
            signature: signature.map(|s| s.to_string()),
            docstring: docstring.map(|s| s.to_string()),
            body_hash: "abc".to_string(),
            children,
            refs: vec![],
        }
    }

    #[test]
    fn docstring_first_sentence_is_used() {
        let node = CodeNodeRow {
            id: 1,
            repo_path: "repo".into(),
            file_path: "f.py".into(),
            kind: "function".into(),
            name: "greet".into(),
            qualified_name: "greet".into(),
            parent_id: None,
            start_line: 1,
            end_line: 2,
            signature: Some("def greet(name):".into()),
            docstring: Some("Say hello to someone. Extra detail.".into()),
            body_hash: "h".into(),
            summary: String::new(),
            depth: 0,
        };
        let summary = summarize_node(&node, &[]);
        assert_eq!(summary, "Function greet - Say hello to someone");
    }

    #[test]
    fn falls_back_to_signature_when_no_docstring() {
        let node = CodeNodeRow {
            id: 1,
            repo_path: "repo".into(),
            file_path: "f.py".into(),
            kind: "function".into(),
            name: "add".into(),
            qualified_name: "Calculator.add".into(),
            parent_id: Some(0),
            start_line: 2,
            end_line: 3,
            signature: Some("def add(self, a, b):".into()),
            docstring: None,
            body_hash: "h".into(),
            summary: String::new(),
            depth: 1,
        };
        let summary = summarize_node(&node, &[]);
        assert_eq!(summary, "Function add (def add(self, a, b):)");
    }

    #[test]
    fn parent_summary_lists_children_in_start_line_order() {
        let node = CodeNodeRow {
            id: 1,
            repo_path: "repo".into(),
            file_path: "f.py".into(),
            kind: "class".into(),
            name: "Calculator".into(),
            qualified_name: "Calculator".into(),
            parent_id: None,
            start_line: 1,
            end_line: 10,
            signature: Some("class Calculator:".into()),
            docstring: None,
            body_hash: "h".into(),
            summary: String::new(),
            depth: 0,
        };
        let children = vec![("subtract".to_string(), 5u32), ("add".to_string(), 2u32)];
        let summary = summarize_node(&node, &children);
        assert_eq!(
            summary,
            "Class Calculator (class Calculator:). Contains: add, subtract"
        );
    }

    #[test]
    fn summarize_all_updates_leaves_before_parent_and_rebuilds_fts() {
        let mut store = Store::in_memory().unwrap();
        let add = draft(CodeKind::Function, "add", "Calculator.add", Some("def add(self, a, b):"), None, 2, vec![]);
        let subtract = draft(
            CodeKind::Function,
            "subtract",
            "Calculator.subtract",
            Some("def subtract(self, a, b):"),
            None,
            4,
            vec![],
        );
        let calculator = draft(
            CodeKind::Class,
            "Calculator",
            "Calculator",
            Some("class Calculator:"),
            None,
            1,
            vec![add, subtract],
        );
        store.replace_code_tree("repo", "calc.py", std::slice::from_ref(&calculator)).unwrap();

        let updated = summarize_all(&mut store, None).unwrap();
        assert_eq!(updated, 3);

        let roots = store.get_roots(None).unwrap();
        let root = &roots[0];
        assert!(root.summary.contains("Contains: add, subtract"));

        let children = store.get_children(root.id).unwrap();
        for child in children {
            assert!(!child.summary.is_empty());
        }
    }
}
