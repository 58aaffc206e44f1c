//! Navigator: bounded beam search over the code tree, scored via full-text rank (§4.7).

use rusqlite::params;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use cartograph_core::error::Result;

use crate::search::sanitize_query;
use crate::store::{CodeNodeRow, Store};

const BEAM_WIDTH: usize = 3;
const MAX_DEPTH: u32 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationStep {
    pub depth: u32,
    pub candidates: Vec<String>,
    pub selected: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    pub nodes: Vec<CodeNodeRow>,
    pub steps: Vec<NavigationStep>,
}

#[instrument(skip(store))]
pub fn navigate(store: &Store, query: &str, repo_path: Option<&str>) -> Result<NavigationResult> {
    let mut visited: Vec<CodeNodeRow> = Vec::new();
    let mut steps: Vec<NavigationStep> = Vec::new();

    let sanitized = sanitize_query(query);
    let scope_ids = store.all_node_ids(repo_path)?;
    if scope_ids.is_empty() {
        return Ok(NavigationResult { nodes: visited, steps });
    }

    let ranked = rank_in_scope(store, &sanitized, &scope_ids, BEAM_WIDTH * 10)?;
    let candidate_names: Vec<String> = names_for(store, &ranked)?;

    let mut frontier: Vec<CodeNodeRow> = take_top(store, &ranked, BEAM_WIDTH)?;
    steps.push(NavigationStep {
        depth: 0,
        candidates: candidate_names,
        selected: frontier.iter().map(|n| n.qualified_name.clone()).collect(),
    });
    for node in &frontier {
        push_unique(&mut visited, node.clone());
    }

    for depth in 1..=MAX_DEPTH {
        let children: Vec<CodeNodeRow> = frontier
            .iter()
            .map(|n| store.get_children(n.id))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect();
        if children.is_empty() {
            break;
        }

        let child_ids: Vec<i64> = children.iter().map(|n| n.id).collect();
        let ranked_children = rank_in_scope(store, &sanitized, &child_ids, BEAM_WIDTH * 10)?;
        let candidate_names: Vec<String> = names_for(store, &ranked_children)?;
        let selected: Vec<CodeNodeRow> = take_top(store, &ranked_children, BEAM_WIDTH)?;

        steps.push(NavigationStep {
            depth,
            candidates: candidate_names,
            selected: selected.iter().map(|n| n.qualified_name.clone()).collect(),
        });
        for node in &selected {
            push_unique(&mut visited, node.clone());
        }

        if selected.is_empty() {
            break;
        }
        frontier = selected;
    }

    Ok(NavigationResult { nodes: visited, steps })
}

/// Full-text rank `(id, score)` pairs for `ids`, scored `1 / (1 + |rank|)`.
fn rank_in_scope(store: &Store, sanitized_query: &str, ids: &[i64], limit: usize) -> Result<Vec<(i64, f32)>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
    let sql = format!(
        "SELECT code_nodes_fts.rowid, rank FROM code_nodes_fts
         WHERE code_nodes_fts MATCH ? AND code_nodes_fts.rowid IN ({})
         ORDER BY rank LIMIT ?",
        placeholders
    );
    let mut stmt = store.conn().prepare(&sql)?;

    let mut bound: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
    bound.push(Box::new(sanitized_query.to_string()));
    for id in ids {
        bound.push(Box::new(*id));
    }
    bound.push(Box::new(limit as i64));

    let params_ref: Vec<&dyn rusqlite::ToSql> = bound.iter().map(|b| b.as_ref()).collect();
    let mut rows = stmt
        .query_map(params_ref.as_slice(), |r| {
            let id: i64 = r.get(0)?;
            let rank: f64 = r.get(1)?;
            Ok((id, 1.0f32 / (1.0 + (rank as f32).abs())))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    rows.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    Ok(rows)
}

fn take_top(store: &Store, ranked: &[(i64, f32)], n: usize) -> Result<Vec<CodeNodeRow>> {
    let mut out = Vec::new();
    for (id, _) in ranked.iter().take(n) {
        if let Some(node) = store.get_node(*id)? {
            out.push(node);
        }
    }
    Ok(out)
}

fn names_for(store: &Store, ranked: &[(i64, f32)]) -> Result<Vec<String>> {
    let mut out = Vec::new();
    for (id, _) in ranked {
        if let Some(node) = store.get_node(*id)? {
            out.push(node.qualified_name);
        }
    }
    Ok(out)
}

fn push_unique(visited: &mut Vec<CodeNodeRow>, node: CodeNodeRow) {
    if !visited.iter().any(|n| n.id == node.id) {
        visited.push(node);
    }
}
