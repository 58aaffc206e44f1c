//! Durable SQLite-backed store.
//!
//! Holds the eight coupled relations: chunks, note fingerprints, code nodes,
//! code refs, code fingerprints, the embedding cache, meta key/values, plus
//! the `chunks_fts` / `code_nodes_fts` full-text virtual tables and the
//! `chunks_vec` vector virtual table (best-effort; absent when the runtime
//! sqlite build has no vector extension).

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use cartograph_core::error::Result;

/// Stamped into `meta["schema_version"]` once, on first schema init (§3).
const SCHEMA_VERSION: &str = "1";

/// A retrievable slice of a Markdown note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRow {
    pub id: String,
    pub path: String,
    pub source: String,
    pub start_line: u32,
    pub end_line: u32,
    pub hash: String,
    pub model: String,
    pub text: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A structural element extracted from source code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeNodeRow {
    pub id: i64,
    pub repo_path: String,
    pub file_path: String,
    pub kind: String,
    pub name: String,
    pub qualified_name: String,
    pub parent_id: Option<i64>,
    pub start_line: u32,
    pub end_line: u32,
    pub signature: Option<String>,
    pub docstring: Option<String>,
    pub body_hash: String,
    pub summary: String,
    pub depth: u32,
}

/// A cross-reference from one code node to a (possibly unresolved) target by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeRefRow {
    pub id: i64,
    pub source_id: i64,
    pub target_name: String,
    pub target_id: Option<i64>,
    pub kind: String,
    pub line: u32,
}

/// Aggregate counters surfaced by `status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    pub chunk_count: u64,
    pub code_node_count: u64,
    pub file_count: u64,
    pub code_file_count: u64,
    pub db_path: String,
    pub db_size_bytes: u64,
    pub vector_capable: bool,
}

/// Whether the runtime SQLite build can create the `vec0` virtual table.
///
/// Probed once and cached: repeatedly attempting `CREATE VIRTUAL TABLE` on a
/// build without the extension is a wasted round trip on every open.
pub struct Store {
    conn: Connection,
    db_path: PathBuf,
    vector_capable: bool,
}

impl Store {
    /// Open (creating if absent) the store at `path`, enabling WAL mode and
    /// foreign keys, and probing for vector-index capability.
    #[instrument(skip_all)]
    pub fn open(path: &Path) -> Result<Self> {
        info!("opening store at {:?}", path);
        cartograph_core::paths::ensure_parent_dir(path)?;

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        let mut store = Store {
            conn,
            db_path: path.to_path_buf(),
            vector_capable: false,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory store for tests; same schema, no WAL (not meaningful without a file).
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let mut store = Store {
            conn,
            db_path: PathBuf::from(":memory:"),
            vector_capable: false,
        };
        store.init_schema()?;
        Ok(store)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn vector_capable(&self) -> bool {
        self.vector_capable
    }

    #[instrument(skip(self))]
    fn init_schema(&mut self) -> Result<()> {
        debug!("initializing schema");

        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                rowid INTEGER PRIMARY KEY,
                id TEXT UNIQUE NOT NULL,
                path TEXT NOT NULL,
                source TEXT NOT NULL,
                start_line INTEGER NOT NULL,
                end_line INTEGER NOT NULL,
                hash TEXT NOT NULL,
                model TEXT NOT NULL,
                text TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_chunks_path ON chunks(path);
            CREATE INDEX IF NOT EXISTS idx_chunks_id ON chunks(id);

            CREATE TABLE IF NOT EXISTS files (
                path TEXT PRIMARY KEY,
                hash TEXT NOT NULL,
                mtime TEXT NOT NULL,
                size INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS code_files (
                repo_path TEXT NOT NULL,
                file_path TEXT NOT NULL,
                hash TEXT NOT NULL,
                mtime TEXT NOT NULL,
                size INTEGER NOT NULL,
                PRIMARY KEY (repo_path, file_path)
            );

            CREATE TABLE IF NOT EXISTS code_nodes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                repo_path TEXT NOT NULL,
                file_path TEXT NOT NULL,
                kind TEXT NOT NULL,
                name TEXT NOT NULL,
                qualified_name TEXT NOT NULL,
                parent_id INTEGER REFERENCES code_nodes(id) ON DELETE CASCADE,
                start_line INTEGER NOT NULL,
                end_line INTEGER NOT NULL,
                signature TEXT,
                docstring TEXT,
                body_hash TEXT NOT NULL,
                summary TEXT NOT NULL DEFAULT '',
                depth INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_code_nodes_file ON code_nodes(repo_path, file_path);
            CREATE INDEX IF NOT EXISTS idx_code_nodes_parent ON code_nodes(parent_id);
            CREATE INDEX IF NOT EXISTS idx_code_nodes_name ON code_nodes(name);

            CREATE TABLE IF NOT EXISTS code_refs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_id INTEGER NOT NULL REFERENCES code_nodes(id) ON DELETE CASCADE,
                target_name TEXT NOT NULL,
                target_id INTEGER,
                kind TEXT NOT NULL,
                line INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_code_refs_source ON code_refs(source_id);

            CREATE TABLE IF NOT EXISTS embedding_cache (
                hash TEXT PRIMARY KEY,
                embedding BLOB NOT NULL
            );

            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE VIRTUAL TABLE IF NOT EXISTS chunks_fts USING fts5(
                text,
                content='chunks',
                content_rowid='rowid',
                tokenize='porter unicode61'
            );

            CREATE TRIGGER IF NOT EXISTS chunks_ai AFTER INSERT ON chunks BEGIN
                INSERT INTO chunks_fts(rowid, text) VALUES (new.rowid, new.text);
            END;
            CREATE TRIGGER IF NOT EXISTS chunks_ad AFTER DELETE ON chunks BEGIN
                INSERT INTO chunks_fts(chunks_fts, rowid, text) VALUES ('delete', old.rowid, old.text);
            END;
            CREATE TRIGGER IF NOT EXISTS chunks_au AFTER UPDATE ON chunks BEGIN
                INSERT INTO chunks_fts(chunks_fts, rowid, text) VALUES ('delete', old.rowid, old.text);
                INSERT INTO chunks_fts(rowid, text) VALUES (new.rowid, new.text);
            END;

            CREATE VIRTUAL TABLE IF NOT EXISTS code_nodes_fts USING fts5(
                name,
                qualified_name,
                summary,
                signature,
                docstring,
                content='code_nodes',
                content_rowid='id',
                tokenize='porter unicode61'
            );
            "#,
        )?;

        self.vector_capable = self.try_create_vector_table();
        if !self.vector_capable {
            debug!("vector extension unavailable, falling back to keyword-only search");
        }

        if self.meta_get("schema_version")?.is_none() {
            self.meta_set("schema_version", SCHEMA_VERSION)?;
        }

        Ok(())
    }

    /// Best-effort creation of the cosine-distance vector virtual table.
    /// Returns whether it succeeded; callers must tolerate `false` forever.
    fn try_create_vector_table(&self) -> bool {
        self.conn
            .execute(
                "CREATE VIRTUAL TABLE IF NOT EXISTS chunks_vec USING vec0(embedding float[384] distance_metric=cosine)",
                [],
            )
            .is_ok()
    }

    // ---------------------------------------------------------------- meta

    pub fn meta_get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row("SELECT value FROM meta WHERE key = ?1", params![key], |r| {
                r.get(0)
            })
            .optional()?)
    }

    pub fn meta_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    // -------------------------------------------------------------- files

    pub fn note_fingerprint(&self, path: &str) -> Result<Option<(String, String, i64)>> {
        Ok(self
            .conn
            .query_row(
                "SELECT hash, mtime, size FROM files WHERE path = ?1",
                params![path],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .optional()?)
    }

    pub fn set_note_fingerprint(&self, path: &str, hash: &str, mtime: &str, size: i64) -> Result<()> {
        self.conn.execute(
            "INSERT INTO files (path, hash, mtime, size) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(path) DO UPDATE SET hash = excluded.hash, mtime = excluded.mtime, size = excluded.size",
            params![path, hash, mtime, size],
        )?;
        Ok(())
    }

    pub fn code_fingerprint(&self, repo_path: &str, file_path: &str) -> Result<Option<(String, String, i64)>> {
        Ok(self
            .conn
            .query_row(
                "SELECT hash, mtime, size FROM code_files WHERE repo_path = ?1 AND file_path = ?2",
                params![repo_path, file_path],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .optional()?)
    }

    pub fn set_code_fingerprint(
        &self,
        repo_path: &str,
        file_path: &str,
        hash: &str,
        mtime: &str,
        size: i64,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO code_files (repo_path, file_path, hash, mtime, size) VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(repo_path, file_path) DO UPDATE SET hash = excluded.hash, mtime = excluded.mtime, size = excluded.size",
            params![repo_path, file_path, hash, mtime, size],
        )?;
        Ok(())
    }

    // ------------------------------------------------------------- chunks

    /// Replace every chunk (and its FTS/vector rows) belonging to `path` with
    /// `chunks`, atomically. `embeddings`, if present, must be the same
    /// length and order as `chunks`.
    #[instrument(skip(self, chunks, embeddings))]
    pub fn replace_chunks_for_path(
        &mut self,
        path: &str,
        chunks: &[ChunkRow],
        embeddings: Option<&[Vec<f32>]>,
    ) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM chunks WHERE path = ?1", params![path])?;

        for (i, chunk) in chunks.iter().enumerate() {
            tx.execute(
                "INSERT INTO chunks (id, path, source, start_line, end_line, hash, model, text, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    chunk.id,
                    chunk.path,
                    chunk.source,
                    chunk.start_line,
                    chunk.end_line,
                    chunk.hash,
                    chunk.model,
                    chunk.text,
                    chunk.created_at,
                    chunk.updated_at,
                ],
            )?;

            if let Some(embeddings) = embeddings {
                let rowid = tx.last_insert_rowid();
                let blob = serialize_embedding(&embeddings[i]);
                let _ = tx.execute(
                    "INSERT INTO chunks_vec (rowid, embedding) VALUES (?1, ?2)",
                    params![rowid, blob],
                );
            }
        }

        tx.commit()?;
        Ok(())
    }

    pub fn get_chunk(&self, id: &str) -> Result<Option<ChunkRow>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, path, source, start_line, end_line, hash, model, text, created_at, updated_at
                 FROM chunks WHERE id = ?1",
                params![id],
                row_to_chunk,
            )
            .optional()?)
    }

    pub fn list_chunks(&self, source: Option<&str>, limit: usize) -> Result<Vec<ChunkRow>> {
        let mut stmt = if source.is_some() {
            self.conn.prepare(
                "SELECT id, path, source, start_line, end_line, hash, model, text, created_at, updated_at
                 FROM chunks WHERE source = ?1 ORDER BY updated_at DESC LIMIT ?2",
            )?
        } else {
            self.conn.prepare(
                "SELECT id, path, source, start_line, end_line, hash, model, text, created_at, updated_at
                 FROM chunks ORDER BY updated_at DESC LIMIT ?1",
            )?
        };

        let rows = if let Some(source) = source {
            stmt.query_map(params![source, limit as i64], row_to_chunk)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        } else {
            stmt.query_map(params![limit as i64], row_to_chunk)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        };
        Ok(rows)
    }

    pub fn insert_chunk(&mut self, chunk: &ChunkRow, embedding: Option<&[f32]>) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO chunks (id, path, source, start_line, end_line, hash, model, text, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(id) DO UPDATE SET text = excluded.text, hash = excluded.hash, updated_at = excluded.updated_at",
            params![
                chunk.id,
                chunk.path,
                chunk.source,
                chunk.start_line,
                chunk.end_line,
                chunk.hash,
                chunk.model,
                chunk.text,
                chunk.created_at,
                chunk.updated_at,
            ],
        )?;

        if let Some(embedding) = embedding {
            let rowid = tx.query_row("SELECT rowid FROM chunks WHERE id = ?1", params![chunk.id], |r| {
                r.get::<_, i64>(0)
            })?;
            let blob = serialize_embedding(embedding);
            let _ = tx.execute(
                "INSERT OR REPLACE INTO chunks_vec (rowid, embedding) VALUES (?1, ?2)",
                params![rowid, blob],
            );
        }

        tx.commit()?;
        Ok(())
    }

    // --------------------------------------------------------- code nodes

    /// Delete the entire existing tree for `(repo_path, file_path)`, then
    /// reinsert `roots` (and their children, recursively) depth-first so
    /// parent rows exist before their children reference them.
    #[instrument(skip(self, roots))]
    pub fn replace_code_tree(
        &mut self,
        repo_path: &str,
        file_path: &str,
        roots: &[super::ast::CodeNodeDraft],
    ) -> Result<usize> {
        let tx = self.conn.transaction()?;

        let existing: Vec<i64> = {
            let mut stmt = tx.prepare(
                "SELECT id FROM code_nodes WHERE repo_path = ?1 AND file_path = ?2",
            )?;
            stmt.query_map(params![repo_path, file_path], |r| r.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?
        };
        for id in &existing {
            tx.execute("DELETE FROM code_refs WHERE source_id = ?1", params![id])?;
        }
        tx.execute(
            "DELETE FROM code_nodes WHERE repo_path = ?1 AND file_path = ?2",
            params![repo_path, file_path],
        )?;

        let mut count = 0usize;
        for root in roots {
            count += insert_node_tree(&tx, repo_path, file_path, root, None, 0)?;
        }

        tx.commit()?;
        Ok(count)
    }

    pub fn get_node(&self, id: i64) -> Result<Option<CodeNodeRow>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, repo_path, file_path, kind, name, qualified_name, parent_id,
                        start_line, end_line, signature, docstring, body_hash, summary, depth
                 FROM code_nodes WHERE id = ?1",
                params![id],
                row_to_node,
            )
            .optional()?)
    }

    pub fn get_children(&self, id: i64) -> Result<Vec<CodeNodeRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, repo_path, file_path, kind, name, qualified_name, parent_id,
                    start_line, end_line, signature, docstring, body_hash, summary, depth
             FROM code_nodes WHERE parent_id = ?1 ORDER BY start_line",
        )?;
        let rows = stmt
            .query_map(params![id], row_to_node)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn get_roots(&self, repo_path: Option<&str>) -> Result<Vec<CodeNodeRow>> {
        let mut stmt = if repo_path.is_some() {
            self.conn.prepare(
                "SELECT id, repo_path, file_path, kind, name, qualified_name, parent_id,
                        start_line, end_line, signature, docstring, body_hash, summary, depth
                 FROM code_nodes WHERE parent_id IS NULL AND repo_path = ?1 ORDER BY file_path, start_line",
            )?
        } else {
            self.conn.prepare(
                "SELECT id, repo_path, file_path, kind, name, qualified_name, parent_id,
                        start_line, end_line, signature, docstring, body_hash, summary, depth
                 FROM code_nodes WHERE parent_id IS NULL ORDER BY file_path, start_line",
            )?
        };
        let rows = if let Some(repo_path) = repo_path {
            stmt.query_map(params![repo_path], row_to_node)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        } else {
            stmt.query_map([], row_to_node)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        };
        Ok(rows)
    }

    /// All node ids, optionally restricted to a repo, for navigator scoping.
    pub fn all_node_ids(&self, repo_path: Option<&str>) -> Result<Vec<i64>> {
        let mut stmt = if repo_path.is_some() {
            self.conn
                .prepare("SELECT id FROM code_nodes WHERE repo_path = ?1")?
        } else {
            self.conn.prepare("SELECT id FROM code_nodes")?
        };
        let rows = if let Some(repo_path) = repo_path {
            stmt.query_map(params![repo_path], |r| r.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?
        } else {
            stmt.query_map([], |r| r.get(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?
        };
        Ok(rows)
    }

    pub fn update_summary(&self, id: i64, summary: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE code_nodes SET summary = ?1 WHERE id = ?2",
            params![summary, id],
        )?;
        Ok(())
    }

    pub fn rebuild_code_fts(&self) -> Result<()> {
        self.conn
            .execute("INSERT INTO code_nodes_fts(code_nodes_fts) VALUES ('rebuild')", [])?;
        Ok(())
    }

    /// All nodes ordered by depth descending (leaves first), for the summarizer.
    pub fn nodes_by_depth_desc(&self, repo_path: Option<&str>) -> Result<Vec<CodeNodeRow>> {
        let mut stmt = if repo_path.is_some() {
            self.conn.prepare(
                "SELECT id, repo_path, file_path, kind, name, qualified_name, parent_id,
                        start_line, end_line, signature, docstring, body_hash, summary, depth
                 FROM code_nodes WHERE repo_path = ?1 ORDER BY depth DESC",
            )?
        } else {
            self.conn.prepare(
                "SELECT id, repo_path, file_path, kind, name, qualified_name, parent_id,
                        start_line, end_line, signature, docstring, body_hash, summary, depth
                 FROM code_nodes ORDER BY depth DESC",
            )?
        };
        let rows = if let Some(repo_path) = repo_path {
            stmt.query_map(params![repo_path], row_to_node)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        } else {
            stmt.query_map([], row_to_node)?
                .collect::<std::result::Result<Vec<_>, _>>()?
        };
        Ok(rows)
    }

    // --------------------------------------------------------- code refs

    pub fn refs_for_node(&self, source_id: i64) -> Result<Vec<CodeRefRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, source_id, target_name, target_id, kind, line FROM code_refs WHERE source_id = ?1",
        )?;
        let rows = stmt
            .query_map(params![source_id], |r| {
                Ok(CodeRefRow {
                    id: r.get(0)?,
                    source_id: r.get(1)?,
                    target_name: r.get(2)?,
                    target_id: r.get(3)?,
                    kind: r.get(4)?,
                    line: r.get(5)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Resolve (and persist) a ref's target_id by looking up a node whose
    /// name or qualified_name equals `target_name`. No-op if already resolved
    /// or no match exists.
    pub fn resolve_ref(&self, id: i64) -> Result<Option<i64>> {
        let (target_id, target_name): (Option<i64>, String) = self.conn.query_row(
            "SELECT target_id, target_name FROM code_refs WHERE id = ?1",
            params![id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;
        if target_id.is_some() {
            return Ok(target_id);
        }
        let resolved: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM code_nodes WHERE name = ?1 OR qualified_name = ?1 LIMIT 1",
                params![target_name],
                |r| r.get(0),
            )
            .optional()?;
        if let Some(resolved) = resolved {
            self.conn.execute(
                "UPDATE code_refs SET target_id = ?1 WHERE id = ?2",
                params![resolved, id],
            )?;
        }
        Ok(resolved)
    }

    // ------------------------------------------------------ embedding cache

    pub fn cached_embedding(&self, hash: &str) -> Result<Option<Vec<f32>>> {
        let blob: Option<Vec<u8>> = self
            .conn
            .query_row(
                "SELECT embedding FROM embedding_cache WHERE hash = ?1",
                params![hash],
                |r| r.get(0),
            )
            .optional()?;
        Ok(blob.map(|b| deserialize_embedding(&b)))
    }

    pub fn cache_embedding(&self, hash: &str, embedding: &[f32]) -> Result<()> {
        let blob = serialize_embedding(embedding);
        self.conn.execute(
            "INSERT INTO embedding_cache (hash, embedding) VALUES (?1, ?2)
             ON CONFLICT(hash) DO UPDATE SET embedding = excluded.embedding",
            params![hash, blob],
        )?;
        Ok(())
    }

    // -------------------------------------------------------------- search

    /// Raw access for the retriever/navigator: issue `sql` with `params`.
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let chunk_count: i64 = self.conn.query_row("SELECT COUNT(*) FROM chunks", [], |r| r.get(0))?;
        let code_node_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM code_nodes", [], |r| r.get(0))?;
        let file_count: i64 = self.conn.query_row("SELECT COUNT(*) FROM files", [], |r| r.get(0))?;
        let code_file_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM code_files", [], |r| r.get(0))?;
        let db_size = std::fs::metadata(&self.db_path).map(|m| m.len()).unwrap_or(0);

        Ok(StoreStats {
            chunk_count: chunk_count as u64,
            code_node_count: code_node_count as u64,
            file_count: file_count as u64,
            code_file_count: code_file_count as u64,
            db_path: self.db_path.to_string_lossy().into_owned(),
            db_size_bytes: db_size,
            vector_capable: self.vector_capable,
        })
    }
}

fn insert_node_tree(
    tx: &rusqlite::Transaction,
    repo_path: &str,
    file_path: &str,
    node: &super::ast::CodeNodeDraft,
    parent_id: Option<i64>,
    depth: u32,
) -> Result<usize> {
    tx.execute(
        "INSERT INTO code_nodes (repo_path, file_path, kind, name, qualified_name, parent_id,
                                  start_line, end_line, signature, docstring, body_hash, summary, depth)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, '', ?12)",
        params![
            repo_path,
            file_path,
            node.kind.as_str(),
            node.name,
            node.qualified_name,
            parent_id,
            node.start_line,
            node.end_line,
            node.signature,
            node.docstring,
            node.body_hash,
            depth,
        ],
    )?;
    let id = tx.last_insert_rowid();

    tx.execute(
        "INSERT INTO code_nodes_fts(rowid, name, qualified_name, summary, signature, docstring)
         VALUES (?1, ?2, ?3, '', ?4, ?5)",
        params![id, node.name, node.qualified_name, node.signature, node.docstring],
    )?;

    for r#ref in &node.refs {
        tx.execute(
            "INSERT INTO code_refs (source_id, target_name, target_id, kind, line) VALUES (?1, ?2, NULL, ?3, ?4)",
            params![id, r#ref.target_name, r#ref.kind, r#ref.line],
        )?;
    }

    let mut count = 1usize;
    for child in &node.children {
        count += insert_node_tree(tx, repo_path, file_path, child, Some(id), depth + 1)?;
    }
    Ok(count)
}

fn row_to_chunk(row: &rusqlite::Row) -> rusqlite::Result<ChunkRow> {
    Ok(ChunkRow {
        id: row.get(0)?,
        path: row.get(1)?,
        source: row.get(2)?,
        start_line: row.get(3)?,
        end_line: row.get(4)?,
        hash: row.get(5)?,
        model: row.get(6)?,
        text: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn row_to_node(row: &rusqlite::Row) -> rusqlite::Result<CodeNodeRow> {
    Ok(CodeNodeRow {
        id: row.get(0)?,
        repo_path: row.get(1)?,
        file_path: row.get(2)?,
        kind: row.get(3)?,
        name: row.get(4)?,
        qualified_name: row.get(5)?,
        parent_id: row.get(6)?,
        start_line: row.get(7)?,
        end_line: row.get(8)?,
        signature: row.get(9)?,
        docstring: row.get(10)?,
        body_hash: row.get(11)?,
        summary: row.get(12)?,
        depth: row.get(13)?,
    })
}

/// Little-endian f32 serialization, matching the wire format the vector index expects.
pub fn serialize_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

pub fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{CodeKind, CodeNodeDraft};

    fn sample_chunk(id: &str, path: &str, text: &str) -> ChunkRow {
        ChunkRow {
            id: id.to_string(),
            path: path.to_string(),
            source: "other".to_string(),
            start_line: 1,
            end_line: 1,
            hash: "h".to_string(),
            model: "test-model".to_string(),
            text: text.to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn open_creates_empty_store() {
        let store = Store::in_memory().unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats.chunk_count, 0);
        assert_eq!(stats.code_node_count, 0);
    }

    #[test]
    fn replace_chunks_is_atomic_upsert() {
        let mut store = Store::in_memory().unwrap();
        let chunks = vec![sample_chunk("a1", "notes/x.md", "hello world")];
        store.replace_chunks_for_path("notes/x.md", &chunks, None).unwrap();

        let got = store.get_chunk("a1").unwrap().unwrap();
        assert_eq!(got.text, "hello world");

        let replaced = vec![sample_chunk("a2", "notes/x.md", "goodbye world")];
        store.replace_chunks_for_path("notes/x.md", &replaced, None).unwrap();

        assert!(store.get_chunk("a1").unwrap().is_none());
        assert!(store.get_chunk("a2").unwrap().is_some());
    }

    #[test]
    fn fts_mirrors_chunk_rows() {
        let mut store = Store::in_memory().unwrap();
        let chunks = vec![sample_chunk("b1", "notes/y.md", "tree-sitter parsing")];
        store.replace_chunks_for_path("notes/y.md", &chunks, None).unwrap();

        let count: i64 = store
            .conn()
            .query_row("SELECT COUNT(*) FROM chunks_fts WHERE chunks_fts MATCH '\"tree-sitter\"'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn code_tree_replace_deletes_whole_tree() {
        let mut store = Store::in_memory().unwrap();
        let child = CodeNodeDraft {
            kind: CodeKind::Function,
            name: "add".to_string(),
            qualified_name: "Calculator.add".to_string(),
            start_line: 2,
            end_line: 3,
            signature: Some("def add(self, a, b):".to_string()),
            docstring: None,
            body_hash: "abc".to_string(),
            children: vec![],
            refs: vec![],
        };
        let root = CodeNodeDraft {
            kind: CodeKind::Class,
            name: "Calculator".to_string(),
            qualified_name: "Calculator".to_string(),
            start_line: 1,
            end_line: 4,
            signature: Some("class Calculator:".to_string()),
            docstring: None,
            body_hash: "def".to_string(),
            children: vec![child],
            refs: vec![],
        };

        let inserted = store
            .replace_code_tree("repo", "calc.py", std::slice::from_ref(&root))
            .unwrap();
        assert_eq!(inserted, 2);

        let roots = store.get_roots(None).unwrap();
        assert_eq!(roots.len(), 1);
        let children = store.get_children(roots[0].id).unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].depth, 1);
        assert_eq!(children[0].qualified_name, "Calculator.add");

        // Reindexing the same file replaces the whole tree, not appends.
        store
            .replace_code_tree("repo", "calc.py", std::slice::from_ref(&root))
            .unwrap();
        assert_eq!(store.get_roots(None).unwrap().len(), 1);
    }

    #[test]
    fn embedding_round_trips_le_f32() {
        let original = vec![0.1f32, -0.5, 1.0, 0.0];
        let bytes = serialize_embedding(&original);
        assert_eq!(bytes.len(), 16);
        let back = deserialize_embedding(&bytes);
        assert_eq!(back, original);
    }

    #[test]
    fn meta_set_then_get() {
        let store = Store::in_memory().unwrap();
        store.meta_set("schema_version", "1").unwrap();
        assert_eq!(store.meta_get("schema_version").unwrap().as_deref(), Some("1"));
        assert_eq!(store.meta_get("missing").unwrap(), None);
    }
}
