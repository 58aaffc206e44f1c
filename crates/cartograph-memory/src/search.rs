//! Retriever: keyword (BM25), vector, and fused hybrid search over chunks (§4.6).

use rusqlite::params;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{instrument, warn};

use cartograph_core::error::Result;

use crate::embedder::EmbeddingProvider;
use crate::store::{serialize_embedding, Store};

const CANDIDATE_MULTIPLIER: usize = 4;
pub const DEFAULT_LIMIT: usize = 5;
const VECTOR_WEIGHT: f32 = 0.7;
const BM25_WEIGHT: f32 = 0.3;
const MIN_SCORE: f32 = 0.35;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub chunk_id: String,
    pub text: String,
    pub path: String,
    pub source: String,
    pub score: f32,
    pub start_line: u32,
    pub end_line: u32,
}

/// Wraps each whitespace-separated token in double quotes, joined with
/// spaces, so operator characters (`-`, `+`, `*`, `NOT`, `OR`, `AND`) are
/// escaped against the full-text query language. An empty query becomes `""`.
pub fn sanitize_query(query: &str) -> String {
    let tokens: Vec<String> = query
        .split_whitespace()
        .map(|t| format!("\"{}\"", t.replace('"', "\"\"")))
        .collect();
    if tokens.is_empty() {
        "\"\"".to_string()
    } else {
        tokens.join(" ")
    }
}

#[instrument(skip(store))]
pub fn search_keyword(store: &Store, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
    let sanitized = sanitize_query(query);
    let pool = limit * CANDIDATE_MULTIPLIER;

    let mut scored = match bm25_candidates(store, &sanitized, pool) {
        Ok(rows) => rows,
        Err(e) => {
            warn!("keyword search degraded to empty: {}", e);
            return Ok(Vec::new());
        }
    };
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);

    to_results(store, scored)
}

#[instrument(skip(store, embedder))]
pub async fn search_vector(
    store: &Store,
    embedder: &dyn EmbeddingProvider,
    query: &str,
    limit: usize,
) -> Result<Vec<SearchResult>> {
    if !store.vector_capable() {
        return Ok(Vec::new());
    }
    let pool = limit * CANDIDATE_MULTIPLIER;
    let vector = embedder.embed_query(query).await?;

    let mut scored = match vector_candidates(store, &vector, pool) {
        Ok(rows) => rows,
        Err(e) => {
            warn!("vector search degraded to empty: {}", e);
            return Ok(Vec::new());
        }
    };
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);

    to_results(store, scored)
}

#[instrument(skip(store, embedder))]
pub async fn search_hybrid(
    store: &Store,
    embedder: &dyn EmbeddingProvider,
    query: &str,
    limit: usize,
) -> Result<Vec<SearchResult>> {
    let pool = limit * CANDIDATE_MULTIPLIER;
    let sanitized = sanitize_query(query);

    let bm25: HashMap<i64, f32> = bm25_candidates(store, &sanitized, pool)
        .unwrap_or_else(|e| {
            warn!("bm25 contribution degraded to empty: {}", e);
            Vec::new()
        })
        .into_iter()
        .collect();

    let vector: HashMap<i64, f32> = if store.vector_capable() {
        let vec = embedder.embed_query(query).await?;
        vector_candidates(store, &vec, pool)
            .unwrap_or_else(|e| {
                warn!("vector contribution degraded to empty: {}", e);
                Vec::new()
            })
            .into_iter()
            .collect()
    } else {
        HashMap::new()
    };

    let mut rowids: Vec<i64> = bm25.keys().chain(vector.keys()).copied().collect();
    rowids.sort_unstable();
    rowids.dedup();

    let mut fused: Vec<(i64, f32)> = rowids
        .into_iter()
        .map(|rowid| {
            let score_b = bm25.get(&rowid).copied().unwrap_or(0.0);
            let score_v = vector.get(&rowid).copied().unwrap_or(0.0);
            (rowid, VECTOR_WEIGHT * score_v + BM25_WEIGHT * score_b)
        })
        .filter(|(_, score)| *score >= MIN_SCORE)
        .collect();

    fused.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    fused.truncate(limit);

    to_results(store, fused)
}

fn bm25_candidates(store: &Store, sanitized_query: &str, pool: usize) -> Result<Vec<(i64, f32)>> {
    let mut stmt = store.conn().prepare(
        "SELECT rowid, rank FROM chunks_fts WHERE chunks_fts MATCH ?1 ORDER BY rank LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(params![sanitized_query, pool as i64], |r| {
            let rowid: i64 = r.get(0)?;
            let rank: f64 = r.get(1)?;
            Ok((rowid, 1.0f32 / (1.0 + (rank as f32).abs())))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn vector_candidates(store: &Store, vector: &[f32], pool: usize) -> Result<Vec<(i64, f32)>> {
    let blob = serialize_embedding(vector);
    let mut stmt = store.conn().prepare(
        "SELECT rowid, distance FROM chunks_vec WHERE embedding MATCH ?1 AND k = ?2 ORDER BY distance",
    )?;
    let rows = stmt
        .query_map(params![blob, pool as i64], |r| {
            let rowid: i64 = r.get(0)?;
            let distance: f64 = r.get(1)?;
            Ok((rowid, 1.0f32 - distance as f32))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn to_results(store: &Store, scored: Vec<(i64, f32)>) -> Result<Vec<SearchResult>> {
    let mut out = Vec::with_capacity(scored.len());
    for (rowid, score) in scored {
        let row: Option<(String, String, String, u32, u32)> = store
            .conn()
            .query_row(
                "SELECT id, text, path, start_line, end_line FROM chunks WHERE rowid = ?1",
                params![rowid],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
            )
            .ok();
        let Some((chunk_id, text, path, start_line, end_line)) = row else {
            continue;
        };
        let source: String = store
            .conn()
            .query_row(
                "SELECT source FROM chunks WHERE rowid = ?1",
                params![rowid],
                |r| r.get(0),
            )
            .unwrap_or_default();
        out.push(SearchResult {
            chunk_id,
            text,
            path,
            source,
            score,
            start_line,
            end_line,
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::PlaceholderEmbedder;
    use crate::store::ChunkRow;

    fn sample(id: &str, path: &str, text: &str, source: &str) -> ChunkRow {
        ChunkRow {
            id: id.to_string(),
            path: path.to_string(),
            source: source.to_string(),
            start_line: 1,
            end_line: 1,
            hash: "h".to_string(),
            model: "m".to_string(),
            text: text.to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn sanitize_wraps_every_token_in_quotes() {
        assert_eq!(sanitize_query("tree-sitter"), "\"tree-sitter\"");
        assert_eq!(sanitize_query("NOT OR AND"), "\"NOT\" \"OR\" \"AND\"");
        assert_eq!(sanitize_query(""), "\"\"");
        assert_eq!(sanitize_query("c++ term*"), "\"c++\" \"term*\"");
    }

    #[test]
    fn keyword_search_finds_matching_chunk() {
        let mut store = Store::in_memory().unwrap();
        store
            .replace_chunks_for_path(
                "docs/guide.md",
                &[sample("c1", "docs/guide.md", "Use OAuth2 for authentication with JWT tokens.", "other")],
                None,
            )
            .unwrap();

        let results = search_keyword(&store, "OAuth authentication", DEFAULT_LIMIT).unwrap();
        assert!(!results.is_empty());
        assert!(results[0].text.contains("OAuth"));
        assert!(results[0].score > 0.0 && results[0].score <= 1.0);
    }

    #[test]
    fn sanitization_survives_operator_characters() {
        let mut store = Store::in_memory().unwrap();
        store
            .replace_chunks_for_path(
                "notes/x.md",
                &[sample("c1", "notes/x.md", "tree-sitter and sqlite-vec", "other")],
                None,
            )
            .unwrap();

        for q in ["tree-sitter", "c++", "NOT OR AND", "term*"] {
            let result = search_keyword(&store, q, DEFAULT_LIMIT);
            assert!(result.is_ok(), "query {:?} raised an error", q);
        }
    }

    #[tokio::test]
    async fn hybrid_search_falls_back_to_keyword_only_without_vector_capability() {
        let mut store = Store::in_memory().unwrap();
        store
            .replace_chunks_for_path(
                "docs/guide.md",
                &[sample(
                    "c1",
                    "docs/guide.md",
                    "Use OAuth2 for authentication with JWT tokens.",
                    "other",
                )],
                None,
            )
            .unwrap();
        assert!(!store.vector_capable());

        let embedder = PlaceholderEmbedder::new();
        let results = search_hybrid(&store, &embedder, "OAuth authentication", DEFAULT_LIMIT)
            .await
            .unwrap();
        for r in &results {
            assert!(r.score >= MIN_SCORE);
            assert!(r.score <= 1.0);
        }
    }

    #[tokio::test]
    async fn vector_search_is_empty_without_vector_capability() {
        let store = Store::in_memory().unwrap();
        let embedder = PlaceholderEmbedder::new();
        let results = search_vector(&store, &embedder, "anything", DEFAULT_LIMIT).await.unwrap();
        assert!(results.is_empty());
    }
}
