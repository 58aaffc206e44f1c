//! Unified error handling for cartograph.
//!
//! All library crates convert their local failures into [`CoreError`] at the
//! point they cross a crate boundary, so callers only ever have to match on
//! one error type.

/// Unified error type for all cartograph operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Lookup by id, path, or node returned nothing.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// Caller-supplied argument was invalid (empty query, bad id, out-of-range limit).
    #[error("invalid input: {0}")]
    BadInput(String),

    /// File extension or detected language has no extractor.
    #[error("unsupported file: {path}")]
    UnsupportedFile { path: String },

    /// AST extraction could not parse the file.
    #[error("failed to parse {path}: {reason}")]
    ParseFailure { path: String, reason: String },

    /// Filesystem I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database failure (schema, query, or transaction).
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML config (de)serialization failure.
    #[error("config error: {0}")]
    Config(String),

    /// An optional capability (vector index, embedder) is not available.
    #[error("capability unavailable: {0}")]
    CapabilityMissing(String),

    /// A sanitized full-text query still triggered an engine-level error.
    #[error("full-text query error: {0}")]
    FtsQuery(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl From<toml::de::Error> for CoreError {
    fn from(err: toml::de::Error) -> Self {
        CoreError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for CoreError {
    fn from(err: toml::ser::Error) -> Self {
        CoreError::Config(err.to_string())
    }
}

impl CoreError {
    /// A one-line, human-friendly hint appended to the bare error message.
    pub fn with_context(&self) -> String {
        match self {
            CoreError::NotFound { what } => {
                format!(
                    "not found: {}.\n  → double-check the id or path\n  → run `cartograph list` to see what's indexed",
                    what
                )
            }
            CoreError::CapabilityMissing(what) => {
                format!(
                    "{}.\n  → vector search is unavailable; `search --keyword` still works\n  → reindex is unaffected, it will simply skip vector rows",
                    format!("capability unavailable: {}", what)
                )
            }
            CoreError::FtsQuery(msg) => {
                format!(
                    "full-text query error: {}.\n  → this query mode returned nothing; other modes are unaffected",
                    msg
                )
            }
            CoreError::ParseFailure { path, reason } => {
                format!(
                    "failed to parse {}: {}.\n  → file is skipped and its fingerprint is left unset so it is retried next run",
                    path, reason
                )
            }
            CoreError::UnsupportedFile { path } => {
                format!(
                    "unsupported file: {}.\n  → no extractor is registered for this extension, it is skipped",
                    path
                )
            }
            other => other.to_string(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        CoreError::NotFound { what: what.into() }
    }

    pub fn bad_input(msg: impl Into<String>) -> Self {
        CoreError::BadInput(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_payload() {
        let err = CoreError::not_found("chunk abc123");
        assert!(err.to_string().contains("chunk abc123"));
    }

    #[test]
    fn context_hints_keyword_fallback() {
        let err = CoreError::CapabilityMissing("vector extension".into());
        let ctx = err.with_context();
        assert!(ctx.contains("keyword"));
    }

    #[test]
    fn context_hints_parse_retry() {
        let err = CoreError::ParseFailure {
            path: "a.py".into(),
            reason: "unexpected token".into(),
        };
        let ctx = err.with_context();
        assert!(ctx.contains("retried"));
    }

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: CoreError = io_err.into();
        assert!(matches!(err, CoreError::Io(_)));
    }

    #[test]
    fn from_sqlite_error() {
        let sql_err = rusqlite::Error::QueryReturnedNoRows;
        let err: CoreError = sql_err.into();
        assert!(matches!(err, CoreError::Database(_)));
    }

    #[test]
    fn result_alias() {
        fn ok() -> Result<()> {
            Ok(())
        }
        fn err() -> Result<()> {
            Err(CoreError::bad_input("empty query"))
        }
        assert!(ok().is_ok());
        assert!(err().is_err());
    }
}
