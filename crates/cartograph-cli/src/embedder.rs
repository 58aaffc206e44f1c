//! Process-scoped embedder singleton.
//!
//! Per the core's design notes: the embedder is lazily initialized on first
//! use and reused for the rest of the invocation. A fresh process (the normal
//! lifetime of this binary) gets a fresh singleton, satisfying the "tests may
//! reset by reopening the database file" requirement trivially.

use once_cell::sync::OnceCell;

use cartograph_memory::PlaceholderEmbedder;

static EMBEDDER: OnceCell<PlaceholderEmbedder> = OnceCell::new();

pub fn embedder() -> &'static PlaceholderEmbedder {
    EMBEDDER.get_or_init(PlaceholderEmbedder::new)
}
