//! Note indexer: glob discovery → hash-gated chunk/embed/upsert pipeline (§4.3).

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use tracing::{debug, info, instrument, warn};

use cartograph_core::error::Result;

use crate::chunker::Chunker;
use crate::embedder::EmbeddingProvider;
use crate::store::{ChunkRow, Store};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoteIndexStats {
    pub indexed: usize,
    pub skipped: usize,
    pub chunks_created: usize,
}

/// `daily-logs` / `sessions` / `MEMORY.md` substring classification per §4.3.
pub fn classify_source(path: &str) -> &'static str {
    if path.contains("daily-logs") {
        "daily"
    } else if path.contains("sessions") {
        "session"
    } else if path.ends_with("MEMORY.md") {
        "memory"
    } else {
        "other"
    }
}

/// Expand glob patterns into a sorted, de-duplicated file list.
pub fn discover_files(patterns: &[String]) -> Vec<String> {
    let mut found = BTreeSet::new();
    for pattern in patterns {
        if let Ok(paths) = glob::glob(pattern) {
            for entry in paths.flatten() {
                found.insert(entry.to_string_lossy().into_owned());
            }
        }
    }
    found.into_iter().collect()
}

#[instrument(skip(store, embedder, patterns))]
pub async fn index_all(
    store: &mut Store,
    embedder: &dyn EmbeddingProvider,
    patterns: &[String],
) -> Result<NoteIndexStats> {
    let mut stats = NoteIndexStats::default();

    for path in discover_files(patterns) {
        match index_one_file(store, embedder, &path).await {
            Ok(Some(created)) => {
                stats.indexed += 1;
                stats.chunks_created += created;
            }
            Ok(None) => stats.skipped += 1,
            Err(e) => {
                warn!("skipping {}: {}", path, e);
                stats.skipped += 1;
            }
        }
    }

    store.meta_set("last_indexed_at", &chrono::Utc::now().to_rfc3339())?;
    info!(
        "note index run: {} indexed, {} skipped, {} chunks created",
        stats.indexed, stats.skipped, stats.chunks_created
    );
    Ok(stats)
}

async fn index_one_file(
    store: &mut Store,
    embedder: &dyn EmbeddingProvider,
    path: &str,
) -> Result<Option<usize>> {
    let bytes = std::fs::read(path)?;
    let hash = content_hash(&bytes);
    let metadata = std::fs::metadata(path)?;
    let size = metadata.len() as i64;
    let mtime = modified_timestamp(&metadata);

    if let Some((existing_hash, _, _)) = store.note_fingerprint(path)? {
        if existing_hash == hash {
            debug!("unchanged, skipping: {}", path);
            return Ok(None);
        }
    }

    let text = match String::from_utf8(bytes) {
        Ok(t) => t,
        Err(_) => {
            warn!("not valid utf-8, skipping: {}", path);
            return Ok(None);
        }
    };

    let chunker = Chunker::new();
    let chunks = chunker.chunk(&text);
    if chunks.is_empty() {
        store.set_note_fingerprint(path, &hash, &mtime, size)?;
        return Ok(None);
    }

    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    let embeddings = embedder.embed_batch(&texts).await?;
    if store.meta_get("embedder_model")?.is_none() {
        store.meta_set("embedder_model", embedder.model_name())?;
    }
    let source = classify_source(path);
    let now = chrono::Utc::now().to_rfc3339();

    let rows: Vec<ChunkRow> = chunks
        .iter()
        .map(|c| ChunkRow {
            id: chunk_id(path, c.start_line, &c.text),
            path: path.to_string(),
            source: source.to_string(),
            start_line: c.start_line,
            end_line: c.end_line,
            hash: content_hash(c.text.as_bytes()),
            model: embedder.model_name().to_string(),
            text: c.text.clone(),
            created_at: now.clone(),
            updated_at: now.clone(),
        })
        .collect();

    let embeddings_ref = if store.vector_capable() {
        Some(embeddings.as_slice())
    } else {
        None
    };
    store.replace_chunks_for_path(path, &rows, embeddings_ref)?;
    store.set_note_fingerprint(path, &hash, &mtime, size)?;

    Ok(Some(rows.len()))
}

/// Stable content-derived chunk id: hash(path : start_line : hash(text)).
fn chunk_id(path: &str, start_line: u32, text: &str) -> String {
    content_hash(format!("{}:{}:{}", path, start_line, content_hash(text.as_bytes())).as_bytes())
}

fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn modified_timestamp(metadata: &std::fs::Metadata) -> String {
    metadata
        .modified()
        .ok()
        .map(|t| {
            let datetime: chrono::DateTime<chrono::Utc> = t.into();
            datetime.to_rfc3339()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::PlaceholderEmbedder;
    use tempfile::tempdir;

    #[test]
    fn classify_matches_spec_rules() {
        assert_eq!(classify_source("/home/u/.claude/agent-memory/daily-logs/2026-01-01.md"), "daily");
        assert_eq!(classify_source("/home/u/.claude/agent-memory/sessions/abc.md"), "session");
        assert_eq!(classify_source("/home/u/.claude/projects/p/memory/MEMORY.md"), "memory");
        assert_eq!(classify_source("/home/u/notes/random.md"), "other");
    }

    #[tokio::test]
    async fn index_then_reindex_is_idempotent() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("guide.md");
        std::fs::write(
            &file,
            "# User Guide\n\n## Authentication\n\nUse OAuth2 for authentication with JWT tokens.\n",
        )
        .unwrap();

        let mut store = Store::in_memory().unwrap();
        let embedder = PlaceholderEmbedder::new();
        let pattern = vec![file.to_string_lossy().into_owned()];

        let stats1 = index_all(&mut store, &embedder, &pattern).await.unwrap();
        assert_eq!(stats1.indexed, 1);
        assert!(stats1.chunks_created > 0);

        let stats2 = index_all(&mut store, &embedder, &pattern).await.unwrap();
        assert_eq!(stats2.indexed, 0);
        assert_eq!(stats2.skipped, 1);
    }

    #[tokio::test]
    async fn modifying_file_triggers_reindex() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("notes.md");
        std::fs::write(&file, "# Title\n\nfirst body\n").unwrap();

        let mut store = Store::in_memory().unwrap();
        let embedder = PlaceholderEmbedder::new();
        let pattern = vec![file.to_string_lossy().into_owned()];

        index_all(&mut store, &embedder, &pattern).await.unwrap();
        std::fs::write(&file, "# Title\n\nsecond body, now different\n").unwrap();
        let stats = index_all(&mut store, &embedder, &pattern).await.unwrap();
        assert_eq!(stats.indexed, 1);
    }
}
