//! Manual chunk CRUD: `add` / `get` / `list`, bypassing the note indexer entirely.
//!
//! The source implementation overloads `path` as both chunk identity input and
//! tag storage (`"manual:<tags>"`); we keep that scheme for id-derivation
//! stability (re-adding the same content/tags/source must be idempotent) while
//! documenting it as a deliberate, not accidental, conflation.

use tracing::instrument;

use cartograph_core::error::{CoreError, Result};

use crate::embedder::content_hash;
use crate::store::{ChunkRow, Store};

/// Adds `content` as a single manual chunk. `id = hash("manual:{content_hash}:{tags}")`
/// so re-adding identical `(content, tags, source)` is a no-op upsert, not a duplicate.
#[instrument(skip(store, content))]
pub fn add_memory(store: &mut Store, content: &str, source: &str, tags: &str) -> Result<ChunkRow> {
    if content.trim().is_empty() {
        return Err(CoreError::bad_input("content must not be empty"));
    }

    let c_hash = content_hash(content);
    let id = content_hash(&format!("manual:{}:{}", c_hash, tags));
    let path = if tags.is_empty() {
        "manual".to_string()
    } else {
        format!("manual:{}", tags)
    };
    let now = chrono::Utc::now().to_rfc3339();

    let row = ChunkRow {
        id,
        path,
        source: source.to_string(),
        start_line: 1,
        end_line: content.lines().count().max(1) as u32,
        hash: c_hash,
        model: "manual".to_string(),
        text: content.trim().to_string(),
        created_at: now.clone(),
        updated_at: now,
    };

    store.insert_chunk(&row, None)?;
    Ok(row)
}

#[instrument(skip(store))]
pub fn get_memory(store: &Store, id: &str) -> Result<ChunkRow> {
    store
        .get_chunk(id)?
        .ok_or_else(|| CoreError::not_found(format!("chunk {}", id)))
}

#[instrument(skip(store))]
pub fn list_memories(store: &Store, source: Option<&str>, limit: usize) -> Result<Vec<ChunkRow>> {
    store.list_chunks(source, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_get_round_trip() {
        let mut store = Store::in_memory().unwrap();
        let added = add_memory(&mut store, "roundtrip test content", "daily", "test").unwrap();

        assert_eq!(added.id.len(), 64);
        assert!(added.id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_uppercase()));

        let fetched = get_memory(&store, &added.id).unwrap();
        assert_eq!(fetched.text, "roundtrip test content");
        assert_eq!(fetched.source, "daily");
        assert!(fetched.path.contains("test"));
    }

    #[test]
    fn readding_same_content_tags_source_is_idempotent() {
        let mut store = Store::in_memory().unwrap();
        let first = add_memory(&mut store, "same content", "other", "x").unwrap();
        let second = add_memory(&mut store, "same content", "other", "x").unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.list_chunks(None, 10).unwrap().len(), 1);
    }

    #[test]
    fn empty_content_is_bad_input() {
        let mut store = Store::in_memory().unwrap();
        let err = add_memory(&mut store, "   ", "other", "").unwrap_err();
        assert!(matches!(err, CoreError::BadInput(_)));
    }

    #[test]
    fn get_missing_id_is_not_found() {
        let store = Store::in_memory().unwrap();
        let err = get_memory(&store, "deadbeef").unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[test]
    fn list_respects_source_filter_and_limit() {
        let mut store = Store::in_memory().unwrap();
        add_memory(&mut store, "a", "daily", "").unwrap();
        add_memory(&mut store, "b", "session", "").unwrap();
        add_memory(&mut store, "c", "daily", "").unwrap();

        let daily = list_memories(&store, Some("daily"), 10).unwrap();
        assert_eq!(daily.len(), 2);

        let limited = list_memories(&store, None, 1).unwrap();
        assert_eq!(limited.len(), 1);
    }
}
