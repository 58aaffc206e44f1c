//! Storage location and note-discovery path conventions.
//!
//! Grounded directly on the original `agent_memory/config.py`: the same three
//! environment variables, the same fallback chain, and the same default scan
//! globs, translated from `os.environ` + `pathlib.Path` into `std::env` +
//! `PathBuf`.

use std::path::PathBuf;

const ENV_DB: &str = "AGENT_MEMORY_DB";
const ENV_DIR: &str = "AGENT_MEMORY_DIR";

/// Resolve the database file path: `$AGENT_MEMORY_DB`, else
/// `$AGENT_MEMORY_DIR/memory.db`, else `~/.claude/agent-memory/memory.db`.
pub fn resolve_db_path() -> PathBuf {
    if let Ok(explicit) = std::env::var(ENV_DB) {
        if !explicit.trim().is_empty() {
            return PathBuf::from(explicit);
        }
    }
    memory_dir().join("memory.db")
}

/// Resolve the memory directory: `$AGENT_MEMORY_DIR`, else `~/.claude/agent-memory`.
pub fn memory_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(ENV_DIR) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".claude")
        .join("agent-memory")
}

/// Default glob patterns scanned by the note indexer, home-relative.
pub fn default_scan_patterns() -> Vec<String> {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    vec![
        home.join(".claude/projects/*/memory/MEMORY.md")
            .to_string_lossy()
            .into_owned(),
        home.join(".claude/agent-memory/daily-logs/*.md")
            .to_string_lossy()
            .into_owned(),
        home.join(".claude/agent-memory/sessions/*.md")
            .to_string_lossy()
            .into_owned(),
    ]
}

/// Ensure the parent directory of `path` exists, creating it if necessary.
pub fn ensure_parent_dir(path: &std::path::Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn explicit_db_path_wins() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var(ENV_DB, "/tmp/cartograph-test/explicit.db");
        std::env::remove_var(ENV_DIR);
        assert_eq!(
            resolve_db_path(),
            PathBuf::from("/tmp/cartograph-test/explicit.db")
        );
        std::env::remove_var(ENV_DB);
    }

    #[test]
    fn dir_fallback_appends_memory_db() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::remove_var(ENV_DB);
        std::env::set_var(ENV_DIR, "/tmp/cartograph-test/dir");
        assert_eq!(
            resolve_db_path(),
            PathBuf::from("/tmp/cartograph-test/dir/memory.db")
        );
        std::env::remove_var(ENV_DIR);
    }

    #[test]
    fn scan_patterns_has_three_entries() {
        let _guard = ENV_LOCK.lock().unwrap();
        let patterns = default_scan_patterns();
        assert_eq!(patterns.len(), 3);
        assert!(patterns[0].ends_with("memory/MEMORY.md"));
        assert!(patterns[1].ends_with("daily-logs/*.md"));
        assert!(patterns[2].ends_with("sessions/*.md"));
    }
}
