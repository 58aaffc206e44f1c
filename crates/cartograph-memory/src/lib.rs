//! # cartograph-memory
//!
//! The indexing and retrieval core: a durable store, Markdown chunking, code
//! AST extraction, hash-gated indexers for both, and the search/navigation
//! engines that read them back.
//!
//! ## Architecture
//!
//! - **Store** ([`store::Store`]): SQLite-backed durable index — chunks,
//!   code nodes, code refs, fingerprints, an embedding cache, and the
//!   `chunks_fts` / `code_nodes_fts` / `chunks_vec` virtual tables.
//! - **Chunker** ([`chunker::Chunker`]): heading-respecting, overlapped
//!   Markdown splitting with exact line ranges.
//! - **Embedder** ([`embedder::EmbeddingProvider`]): the batch text → unit
//!   vector capability contract, plus a deterministic placeholder.
//! - **AST extractor** ([`ast`]): tree-sitter parsing into a forest of
//!   [`ast::CodeNodeDraft`] values.
//! - **Note indexer** ([`note_indexer`]) / **Code indexer** ([`code_indexer`]):
//!   the two hash-gated ingest pipelines.
//! - **Retriever** ([`search`]): keyword, vector, and fused hybrid search.
//! - **Navigator** ([`navigator`]): beam search over the code tree.
//! - **Summarizer** ([`summarizer`]): deterministic fallback summaries.
//! - **crud** ([`crud`]): manual add/get/list of chunks outside the indexer.

pub mod ast;
pub mod chunker;
pub mod code_indexer;
pub mod crud;
pub mod embedder;
pub mod navigator;
pub mod note_indexer;
pub mod search;
pub mod store;
pub mod summarizer;

pub use ast::{detect_language, parse_file, CodeKind, CodeNodeDraft, Language};
pub use chunker::{Chunk, ChunkOptions, Chunker};
pub use code_indexer::{discover_code_files, index_codebase, CodeIndexStats};
pub use crud::{add_memory, get_memory, list_memories};
pub use embedder::{content_hash, EmbeddingProvider, PlaceholderEmbedder, EMBEDDING_DIM};
pub use navigator::{navigate, NavigationResult, NavigationStep};
pub use note_indexer::{classify_source, discover_files, index_all, NoteIndexStats};
pub use search::{search_hybrid, search_keyword, search_vector, sanitize_query, SearchResult, DEFAULT_LIMIT};
pub use store::{ChunkRow, CodeNodeRow, CodeRefRow, Store, StoreStats};
pub use summarizer::summarize_all;
