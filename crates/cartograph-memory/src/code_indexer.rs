//! Code indexer: deterministic directory walk → hash-gated AST extraction → tree upsert (§4.5).

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use cartograph_core::error::Result;

use crate::ast::{detect_language, parse_file, Language};
use crate::store::Store;

const SKIP_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "__pycache__",
    ".venv",
    "venv",
    ".tox",
    ".mypy_cache",
    ".pytest_cache",
    "dist",
    "build",
    ".next",
    ".nuxt",
    "coverage",
    ".cache",
    ".eggs",
    "vendor",
    "target",
];

const CODE_EXTENSIONS: &[&str] = &[
    "py", "ts", "tsx", "js", "jsx", "rs", "go", "java", "rb", "c", "h", "cpp", "hpp", "cs",
    "swift", "kt", "lua", "sh", "bash",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeIndexStats {
    pub files_indexed: usize,
    pub files_skipped: usize,
    pub nodes_created: usize,
}

/// Recursively walk `root` in deterministic sorted order, skipping hidden
/// directories and the fixed blacklist, returning code-extension files.
pub fn discover_code_files(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    walk(root, &mut out);
    out.sort();
    out
}

fn walk(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    let mut children: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
    children.sort();

    for path in children {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n,
            None => continue,
        };
        if path.is_dir() {
            if name.starts_with('.') || SKIP_DIRS.contains(&name) {
                continue;
            }
            walk(&path, out);
        } else if is_code_file(&path) {
            out.push(path);
        }
    }
}

fn is_code_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| CODE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[instrument(skip(store))]
pub fn index_codebase(store: &mut Store, repo_path: &Path) -> Result<CodeIndexStats> {
    let repo_key = repo_path.to_string_lossy().into_owned();
    let mut stats = CodeIndexStats::default();

    for file in discover_code_files(repo_path) {
        let file_key = file.to_string_lossy().into_owned();
        match index_one_file(store, &repo_key, &file, &file_key) {
            Ok(created) => {
                stats.files_indexed += 1;
                stats.nodes_created += created;
            }
            Err(e) => {
                warn!("skipping {}: {}", file_key, e);
                stats.files_skipped += 1;
            }
        }
    }

    store.meta_set("last_indexed_at", &chrono::Utc::now().to_rfc3339())?;
    info!(
        "code index run over {:?}: {} indexed, {} skipped, {} nodes",
        repo_path, stats.files_indexed, stats.files_skipped, stats.nodes_created
    );
    Ok(stats)
}

fn index_one_file(store: &mut Store, repo_key: &str, file: &Path, file_key: &str) -> Result<usize> {
    let bytes = std::fs::read(file)?;
    let hash = content_hash(&bytes);
    let metadata = std::fs::metadata(file)?;
    let size = metadata.len() as i64;
    let mtime = metadata
        .modified()
        .ok()
        .map(|t| {
            let dt: chrono::DateTime<chrono::Utc> = t.into();
            dt.to_rfc3339()
        })
        .unwrap_or_default();

    if let Some((existing_hash, _, _)) = store.code_fingerprint(repo_key, file_key)? {
        if existing_hash == hash {
            debug!("unchanged, skipping: {}", file_key);
            return Ok(0);
        }
    }

    let language = detect_language(file_key);
    if matches!(language, Language::Other) {
        // Recorded as "known", so the next run doesn't retry it either.
        store.set_code_fingerprint(repo_key, file_key, &hash, &mtime, size)?;
        return Ok(0);
    }

    let text = match String::from_utf8(bytes) {
        Ok(t) => t,
        Err(_) => {
            store.set_code_fingerprint(repo_key, file_key, &hash, &mtime, size)?;
            return Ok(0);
        }
    };

    let nodes = parse_file(&text, language);
    let inserted = store.replace_code_tree(repo_key, file_key, &nodes)?;
    store.set_code_fingerprint(repo_key, file_key, &hash, &mtime, size)?;
    Ok(inserted)
}

fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
